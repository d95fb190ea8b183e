fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use micloud_drive::finalize::{build_commit_request, build_existing_request};
    use micloud_drive::negotiate::{build_negotiate_request, interpret_create_response};
    use micloud_drive::types::{CreateFileData, Envelope, FolderData};
    use micloud_drive::{BlockNegotiation, CommitEntry, FileKind, NegotiationResult, RemoteFile};
    use micloud_transfer::{BlockDescriptor, FileDescriptor, digest_bytes};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Normalizes JSON values so that `65` and `65.0` compare as equal.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => serde_json::json!(f),
                None => v.clone(),
            },
            serde_json::Value::Object(map) => {
                let normalized: serde_json::Map<String, serde_json::Value> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect();
                serde_json::Value::Object(normalized)
            }
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Compares a serialized request with a fixture (order-independent).
    fn assert_matches_fixture<T: serde::Serialize>(value: &T, name: &str) {
        let fixture = load_fixture(name);
        let actual = serde_json::to_value(value)
            .unwrap_or_else(|e| panic!("failed to serialize for {name}: {e}"));
        assert_eq!(
            normalize_value(&fixture),
            normalize_value(&actual),
            "wire mismatch for {name}:\n  fixture: {fixture}\n  rust:    {actual}"
        );
    }

    /// Deserializes a fixture, re-serializes it, and compares the JSON values.
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        assert_matches_fixture(&parsed, name);
    }

    fn envelope<T: serde::de::DeserializeOwned>(name: &str) -> Envelope<T> {
        serde_json::from_value(load_fixture(name))
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"))
    }

    /// `hello.txt` ("hello world") split into "hello " and "world".
    fn hello_file() -> (FileDescriptor, Vec<BlockDescriptor>) {
        let file = FileDescriptor {
            path: PathBuf::from("hello.txt"),
            name: "hello.txt".into(),
            size: 11,
            digests: digest_bytes(b"hello world"),
        };
        let blocks = vec![
            BlockDescriptor {
                ordinal: 0,
                offset: 0,
                size: 6,
                digests: digest_bytes(b"hello "),
            },
            BlockDescriptor {
                ordinal: 1,
                offset: 6,
                size: 5,
                digests: digest_bytes(b"world"),
            },
        ];
        (file, blocks)
    }

    fn pending_from_fixture() -> micloud_drive::PendingUpload {
        let data = envelope::<CreateFileData>("create_response_pending.json")
            .data
            .expect("fixture has data");
        match interpret_create_response(data, 2).unwrap() {
            NegotiationResult::Pending(pending) => pending,
            other => panic!("expected pending upload, got {other:?}"),
        }
    }

    // --- Requests ---

    #[test]
    fn fixture_negotiate_request() {
        let (file, blocks) = hello_file();
        assert_matches_fixture(
            &build_negotiate_request(&file, &blocks),
            "negotiate_request.json",
        );
    }

    #[test]
    fn fixture_finalize_existing_request() {
        assert_matches_fixture(
            &build_existing_request("hello.txt", "UP1a2b3c4d"),
            "finalize_existing_request.json",
        );
    }

    #[test]
    fn fixture_finalize_commit_request() {
        let (file, _) = hello_file();
        let commits = vec![
            CommitEntry {
                commit_meta: "cm-block-0".into(),
            },
            CommitEntry {
                commit_meta: "cm-block-1".into(),
            },
        ];
        assert_matches_fixture(
            &build_commit_request(&file, &pending_from_fixture(), commits),
            "finalize_commit_request.json",
        );
    }

    // --- Responses ---

    #[test]
    fn fixture_create_response_existing() {
        let env = envelope::<CreateFileData>("create_response_existing.json");
        assert_eq!(env.result, "ok");

        let result = interpret_create_response(env.data.unwrap(), 2).unwrap();
        assert_eq!(
            result,
            NegotiationResult::Existing {
                upload_id: "UP1a2b3c4d".into()
            }
        );
    }

    #[test]
    fn fixture_create_response_pending() {
        let pending = pending_from_fixture();
        assert_eq!(pending.node_url, "https://sgp-node1.mi-cdn.test");
        assert_eq!(pending.file_meta, "fmAbC+/=");
        assert_eq!(pending.upload_id, "UP9f8e7d6c");
        assert_eq!(
            pending.blocks,
            vec![
                BlockNegotiation::Existing {
                    commit_meta: "cm-block-0".into()
                },
                BlockNegotiation::Missing {
                    block_meta: "bm-block-1".into()
                },
            ]
        );
    }

    #[test]
    fn fixture_folder_listing() {
        let env = envelope::<FolderData>("folder_listing.json");
        let list = env.data.unwrap().list;

        assert_eq!(list.len(), 2);
        assert!(list[0].is_folder());
        assert_eq!(list[0].size, 0);
        assert_eq!(list[0].revision.as_deref(), Some("29521048312250401"));
        assert_eq!(list[1].revision, None);
        assert_eq!(list[1].id, "29521055112250400");
        assert_eq!(list[1].kind, FileKind::File);
        assert_eq!(list[1].modify_time, 1_590_000_100_000);
    }

    #[test]
    fn fixture_remote_file() {
        roundtrip_test::<RemoteFile>("remote_file.json");
    }
}

//! Soft-delete visibility properties
//!
//! For any set of records and any subset soft-deleted:
//! - default listings never contain a soft-deleted record
//! - every record stays fetchable by id

use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use zoo_store::{Actor, MemoryBackend, Record, RecordExt, SystemClock, Table, TableConfig};

fn user_table() -> Table {
    Table::new(
        TableConfig::new("quest-dev-user", "userId"),
        Arc::new(MemoryBackend::new()),
        Arc::new(SystemClock),
    )
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn soft_deleted_records_hidden_but_fetchable(
        count in 1..20usize,
        deleted in proptest::collection::btree_set(0..20usize, 0..20),
    ) {
        let rt = runtime();
        rt.block_on(async {
            let table = user_table();
            for i in 0..count {
                let record: Record = serde_json::from_value(json!({"userId": format!("u{i}")})).unwrap();
                table.create(record, &Actor::system()).await.unwrap();
            }

            let deleted: BTreeSet<usize> = deleted.into_iter().filter(|i| *i < count).collect();
            for i in &deleted {
                table.soft_delete(&format!("u{i}"), &Actor::system()).await.unwrap();
            }

            let visible = table.list(true).await.unwrap();
            prop_assert_eq!(visible.len(), count - deleted.len());
            for record in &visible {
                prop_assert!(!record.flag("softDelete"));
            }

            for i in 0..count {
                let fetched = table.get(&format!("u{i}")).await.unwrap();
                prop_assert!(fetched.is_some());
                prop_assert_eq!(fetched.unwrap().flag("softDelete"), deleted.contains(&i));
            }
            Ok(())
        })?;
    }
}

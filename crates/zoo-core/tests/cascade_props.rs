//! Property tests for cascade counts

use proptest::prelude::*;
use zoo_core::{CascadeConfig, CascadeEngine, EntityKind, Stores};
use zoo_store::Actor;
use zoo_test_utils::{conversation, family, user};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Family delete reaches every user and each user's conversations once
    #[test]
    fn family_cascade_total(conversations_per_user in prop::collection::vec(0usize..4, 0..5)) {
        let stores = Stores::in_memory();
        let actor = Actor::system();

        let (total, repeat) = tokio_test::block_on(async {
            stores.table(EntityKind::Family).create(family("f1"), &actor).await.unwrap();
            for (u, count) in conversations_per_user.iter().enumerate() {
                let user_id = format!("u{u}");
                stores.table(EntityKind::User).create(user(&user_id, "f1"), &actor).await.unwrap();
                for c in 0..*count {
                    stores
                        .table(EntityKind::Conversation)
                        .create(conversation(&format!("c{u}-{c}"), &user_id, "leo"), &actor)
                        .await
                        .unwrap();
                }
            }

            let engine = CascadeEngine::new(stores.clone(), CascadeConfig::default());
            let first = engine
                .process_cascade_delete(EntityKind::Family, "f1", true, None)
                .await
                .unwrap();
            let second = engine
                .process_cascade_delete(EntityKind::Family, "f1", true, None)
                .await
                .unwrap();
            (first.total_affected, second.total_affected)
        });

        let expected = 1 + conversations_per_user.len() + conversations_per_user.iter().sum::<usize>();
        prop_assert_eq!(total, expected);
        prop_assert_eq!(repeat, 0);
    }
}

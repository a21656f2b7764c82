//! Property-based tests for topic naming

use proptest::prelude::*;

use justjio::backend::broker::TopicNames;
use justjio::shared::config::Environment;

fn environment() -> impl Strategy<Value = Environment> {
    prop_oneof![
        Just(Environment::Dev),
        Just(Environment::Staging),
        Just(Environment::Prod),
    ]
}

proptest! {
    #[test]
    fn test_user_topics_are_distinct(
        prefix in "[a-z]{1,12}",
        env in environment(),
        a in any::<i64>(),
        b in any::<i64>(),
    ) {
        prop_assume!(a != b);
        let names = TopicNames::new(prefix, env);
        prop_assert_ne!(names.user_topic(a), names.user_topic(b));
    }

    #[test]
    fn test_topic_and_group_share_a_scope(prefix in "[a-z]{1,12}", env in environment(), user in 0i64..1_000_000) {
        let names = TopicNames::new(prefix.clone(), env);
        let topic = names.user_topic(user);
        let group = names.consumer_group();

        let topic_scope = topic.strip_suffix(&format!("-user-{}", user)).unwrap();
        let group_scope = group.strip_suffix("-chat-service").unwrap();
        prop_assert_eq!(topic_scope, group_scope);
        prop_assert!(topic.starts_with(&prefix));
    }
}

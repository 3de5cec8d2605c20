use rusqlite::Connection;
use scribe_core::db::migrations::latest_version;
use scribe_core::db::open_db_in_memory;
use scribe_core::{
    apply_rule_set, ContentRule, EntryDraft, EntryPatch, EntryRepository, RuleError, RuleService,
    SqliteEntryRepository, SqliteRuleRepository, StoreConfig,
};

#[test]
fn add_and_list_orders_rules_ascending() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRuleRepository::try_new(&conn).unwrap();
    let rules = RuleService::new(repo);

    rules.add_rule("second", "2", 20).unwrap();
    rules.add_rule("first", "1", 10).unwrap();
    rules.add_rule("third", "3", 30).unwrap();

    let listed = rules.list_rules().unwrap();
    assert_eq!(
        listed,
        vec![
            ContentRule::new(10, "first", "1"),
            ContentRule::new(20, "second", "2"),
            ContentRule::new(30, "third", "3"),
        ]
    );
}

#[test]
fn add_rejects_blank_patterns_and_non_positive_orders() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRuleRepository::try_new(&conn).unwrap();
    let rules = RuleService::new(repo);

    assert!(matches!(
        rules.add_rule("   ", "x", 1),
        Err(RuleError::BlankPattern)
    ));
    assert!(matches!(
        rules.add_rule("cat", "x", 0),
        Err(RuleError::NonPositiveOrder(0))
    ));
    assert!(matches!(
        rules.add_rule("cat", "x", -3),
        Err(RuleError::NonPositiveOrder(-3))
    ));
    assert!(rules.list_rules().unwrap().is_empty());
}

#[test]
fn add_rejects_duplicate_orders_and_patterns() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRuleRepository::try_new(&conn).unwrap();
    let rules = RuleService::new(repo);

    rules.add_rule("cat", "dog", 1).unwrap();

    assert!(matches!(
        rules.add_rule("mouse", "rat", 1),
        Err(RuleError::DuplicateOrder(1))
    ));
    let err = rules.add_rule("cat", "lion", 2).unwrap_err();
    assert!(matches!(err, RuleError::DuplicatePattern(pattern) if pattern == "cat"));
    assert_eq!(rules.list_rules().unwrap().len(), 1);
}

#[test]
fn delete_reports_whether_a_rule_was_removed() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRuleRepository::try_new(&conn).unwrap();
    let rules = RuleService::new(repo);

    rules.add_rule("cat", "dog", 1).unwrap();

    assert!(rules.delete_rule(1).unwrap());
    assert!(!rules.delete_rule(1).unwrap());
    assert!(!rules.delete_rule(99).unwrap());
}

#[test]
fn entry_writes_run_rules_in_ascending_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRuleRepository::try_new(&conn).unwrap();
    let rules = RuleService::new(repo);
    let entries = SqliteEntryRepository::try_new(&conn, StoreConfig::default()).unwrap();

    // Each rule feeds the next: cat -> dog, then dog -> wolf.
    rules.add_rule("cat", "dog", 1).unwrap();
    rules.add_rule("dog", "wolf", 2).unwrap();

    let id = entries.create_entry(&draft("one cat here")).unwrap();

    let loaded = entries.get_entry(id).unwrap().unwrap();
    assert_eq!(loaded.content, "one cat here");
    assert_eq!(loaded.dynamic_content.as_deref(), Some("one wolf here"));
}

#[test]
fn rule_order_changes_the_pipeline_output() {
    let reversed = apply_rule_set(
        &[
            ContentRule::new(1, "dog", "wolf"),
            ContentRule::new(2, "cat", "dog"),
        ],
        "one cat here",
    );
    // "dog -> wolf" ran before any dog existed, so the cascade stops at dog.
    assert_eq!(reversed.output, "one dog here");
    assert!(reversed.skipped.is_empty());
}

#[test]
fn edit_reapplies_rules_to_the_new_content() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRuleRepository::try_new(&conn).unwrap();
    let rules = RuleService::new(repo);
    let entries = SqliteEntryRepository::try_new(&conn, StoreConfig::default()).unwrap();

    rules.add_rule("cat", "dog", 1).unwrap();
    let id = entries.create_entry(&draft("a cat")).unwrap();

    entries
        .edit_entry(
            id,
            "jordan",
            &EntryPatch {
                content: Some("two cats".to_string()),
                ..EntryPatch::default()
            },
        )
        .unwrap();

    let loaded = entries.get_entry(id).unwrap().unwrap();
    assert_eq!(loaded.content, "two cats");
    assert_eq!(loaded.dynamic_content.as_deref(), Some("two dogs"));
}

#[test]
fn malformed_rule_is_skipped_and_later_rules_still_run() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRuleRepository::try_new(&conn).unwrap();
    let rules = RuleService::new(repo);
    let entries = SqliteEntryRepository::try_new(&conn, StoreConfig::default()).unwrap();

    rules.add_rule("(unclosed", "x", 1).unwrap();
    rules.add_rule("cat", "dog", 2).unwrap();

    let id = entries.create_entry(&draft("a cat")).unwrap();
    let loaded = entries.get_entry(id).unwrap().unwrap();
    assert_eq!(loaded.dynamic_content.as_deref(), Some("a dog"));

    let report = apply_rule_set(&rules.list_rules().unwrap(), "a cat");
    assert_eq!(report.output, "a dog");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].rule_order, 1);
    assert_eq!(report.skipped[0].pattern, "(unclosed");
}

#[test]
fn replacements_interpolate_capture_groups() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRuleRepository::try_new(&conn).unwrap();
    let rules = RuleService::new(repo);
    let entries = SqliteEntryRepository::try_new(&conn, StoreConfig::default()).unwrap();

    rules
        .add_rule(r"(\w+)@example\.com", "$1 [at] example.com", 1)
        .unwrap();

    let id = entries.create_entry(&draft("mail nick@example.com today")).unwrap();
    let loaded = entries.get_entry(id).unwrap().unwrap();
    assert_eq!(
        loaded.dynamic_content.as_deref(),
        Some("mail nick [at] example.com today")
    );
}

#[test]
fn reorder_applies_a_complete_permutation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRuleRepository::try_new(&conn).unwrap();
    let rules = RuleService::new(repo);

    rules.add_rule("cat", "dog", 1).unwrap();
    rules.add_rule("dog", "wolf", 2).unwrap();
    rules.add_rule("bird", "crow", 3).unwrap();

    rules.reorder_rules(&[(1, 3), (2, 1), (3, 2)]).unwrap();

    let listed = rules.list_rules().unwrap();
    assert_eq!(
        listed,
        vec![
            ContentRule::new(1, "dog", "wolf"),
            ContentRule::new(2, "bird", "crow"),
            ContentRule::new(3, "cat", "dog"),
        ]
    );
}

#[test]
fn reorder_swaps_two_rules() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRuleRepository::try_new(&conn).unwrap();
    let rules = RuleService::new(repo);

    rules.add_rule("cat", "dog", 1).unwrap();
    rules.add_rule("dog", "wolf", 2).unwrap();

    rules.reorder_rules(&[(1, 2), (2, 1)]).unwrap();

    let listed = rules.list_rules().unwrap();
    assert_eq!(listed[0], ContentRule::new(1, "dog", "wolf"));
    assert_eq!(listed[1], ContentRule::new(2, "cat", "dog"));
}

#[test]
fn reorder_rejects_incomplete_or_conflicting_permutations() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRuleRepository::try_new(&conn).unwrap();
    let rules = RuleService::new(repo);

    rules.add_rule("cat", "dog", 1).unwrap();
    rules.add_rule("dog", "wolf", 2).unwrap();
    let before = rules.list_rules().unwrap();

    // Missing an assignment for rule 2.
    assert!(matches!(
        rules.reorder_rules(&[(1, 2)]),
        Err(RuleError::InvalidPermutation(_))
    ));
    // Unknown current order.
    assert!(matches!(
        rules.reorder_rules(&[(1, 2), (9, 1)]),
        Err(RuleError::InvalidPermutation(_))
    ));
    // Two rules land on the same target order.
    assert!(matches!(
        rules.reorder_rules(&[(1, 3), (2, 3)]),
        Err(RuleError::InvalidPermutation(_))
    ));
    // Non-positive target order.
    assert!(matches!(
        rules.reorder_rules(&[(1, 0), (2, 1)]),
        Err(RuleError::InvalidPermutation(_))
    ));

    assert_eq!(rules.list_rules().unwrap(), before);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteRuleRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RuleError::UninitializedConnection { actual_version: 0, .. })
    ));
}

#[test]
fn repository_rejects_connection_without_rules_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteRuleRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RuleError::MissingRequiredTable("content_rules"))
    ));
}

fn draft(content: &str) -> EntryDraft {
    EntryDraft {
        category: "books".to_string(),
        sub_category: "fiction".to_string(),
        title: "Gatsby".to_string(),
        content: content.to_string(),
        author: "nick".to_string(),
        ..EntryDraft::default()
    }
}

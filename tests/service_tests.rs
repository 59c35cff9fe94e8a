use contacts_api::{
    BulkFailurePolicy, BulkItemStatus, Contact, ContactError, ContactId, ContactService,
    MemoryStore, PageLimits,
};
use std::collections::HashSet;
use std::sync::Arc;

fn service() -> ContactService {
    ContactService::new(Arc::new(MemoryStore::new()))
}

#[tokio::test]
async fn ann_lifecycle_scenario() {
    let svc = service();

    let ann = svc.insert(Contact::named("Ann")).await.unwrap();
    let id = ann.id.expect("store assigns an id");
    assert_eq!(ann, Contact::named("Ann").with_id(id));

    assert_eq!(svc.get(id).await.unwrap(), ann);
    assert_eq!(svc.delete(id).await.unwrap(), ann);
    assert!(matches!(svc.get(id).await, Err(ContactError::NotFound(_))));
    assert!(matches!(svc.delete(id).await, Err(ContactError::NotFound(_))));
}

#[tokio::test]
async fn insert_round_trips_every_field() {
    let svc = service();
    let full = Contact::named("Bo")
        .with_email("bo@example.com")
        .with_phone("+4712345678")
        .with_country("NO")
        .with_favourite(true);

    let stored = svc.insert(full.clone()).await.unwrap();
    let fetched = svc.get(stored.id.unwrap()).await.unwrap();
    assert_eq!(fetched, full.with_id(stored.id.unwrap()));
}

#[tokio::test]
async fn blank_names_never_persist() {
    let svc = service();
    for name in ["", " ", "\t\n"] {
        assert!(matches!(
            svc.insert(Contact::named(name)).await,
            Err(ContactError::Validation(_))
        ));
        assert!(matches!(
            svc.update(Contact::named(name).with_id(ContactId::new(1).unwrap())).await,
            Err(ContactError::Validation(_))
        ));
    }
    assert!(svc.list(None, None).await.unwrap().items.is_empty());
}

#[tokio::test]
async fn insert_with_supplied_id_overwrites_existing() {
    let svc = service();
    let first = svc.insert(Contact::named("First")).await.unwrap();
    let again = svc
        .insert(Contact::named("Second").with_id(first.id.unwrap()))
        .await
        .unwrap();
    assert_eq!(again.id, first.id);
    assert_eq!(svc.get(first.id.unwrap()).await.unwrap().name, "Second");
}

#[tokio::test]
async fn two_pages_of_five_cover_distinct_items() {
    let svc = service();
    for n in 0..5 {
        svc.insert(Contact::named(format!("c{n}"))).await.unwrap();
    }

    let first = svc.list(Some(2), None).await.unwrap();
    assert_eq!(first.items.len(), 2);
    let token = first.next_page_token.clone().expect("continuation token");
    assert!(!token.as_str().is_empty());

    let second = svc.list(Some(2), Some(token.as_str())).await.unwrap();
    assert_eq!(second.items.len(), 2);

    let ids: HashSet<_> = first
        .items
        .iter()
        .chain(&second.items)
        .map(|c| c.id.unwrap())
        .collect();
    assert_eq!(ids.len(), 4);

    let expected: Vec<_> = (1..=4).map(|raw| ContactId::new(raw).unwrap()).collect();
    let mut ordered: Vec<_> = ids.into_iter().collect();
    ordered.sort();
    assert_eq!(ordered, expected);
}

#[tokio::test]
async fn list_clamps_to_max_page_size() {
    let svc = service().with_page_limits(PageLimits {
        default_page_size: 2,
        max_page_size: 3,
    });
    for n in 0..6 {
        svc.insert(Contact::named(format!("c{n}"))).await.unwrap();
    }
    assert_eq!(svc.list(None, None).await.unwrap().items.len(), 2);
    assert_eq!(svc.list(Some(50), None).await.unwrap().items.len(), 3);
}

#[tokio::test]
async fn bulk_insert_keeps_order_and_skips_persisted() {
    let svc = service();
    let kept = svc.insert(Contact::named("Kept").with_phone("1")).await.unwrap();

    let outcome = svc
        .insert_many(vec![
            Contact::named("New 1"),
            Contact::named("Ignored").with_id(kept.id.unwrap()),
            Contact::named("New 2"),
        ])
        .await
        .unwrap();

    assert_eq!(
        outcome.statuses,
        [
            BulkItemStatus::Inserted,
            BulkItemStatus::Skipped,
            BulkItemStatus::Inserted
        ]
    );
    let names: Vec<_> = outcome.items.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["New 1", "Kept", "New 2"]);
    assert_eq!(svc.get(kept.id.unwrap()).await.unwrap(), kept);
}

#[tokio::test]
async fn bulk_policy_is_configurable() {
    let batch = || vec![Contact::named("A"), Contact::named(""), Contact::named("C")];

    let fail_fast = service();
    assert!(matches!(
        fail_fast.insert_many(batch()).await,
        Err(ContactError::BatchItemFailed { index: 1, .. })
    ));
    assert_eq!(fail_fast.list(None, None).await.unwrap().items.len(), 1);

    let lenient = service().with_bulk_policy(BulkFailurePolicy::ContinueOnError);
    let outcome = lenient.insert_many(batch()).await.unwrap();
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].index, 1);
    assert_eq!(lenient.list(None, None).await.unwrap().items.len(), 2);
}

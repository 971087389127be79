//! Backend-agnostic conformance checks for [`DocumentStore`] implementations.
//!
//! Each check takes a fresh store and panics on the first deviation, so
//! implementations can run the same suite from a `#[tokio::test]`:
//!
//! ```rust,ignore
//! #[tokio::test]
//! async fn memory_store_conforms() {
//!     docshare_testkit::conformance::run_all(|| MemoryStore::new()).await;
//! }
//! ```

use std::collections::HashSet;

use docshare_core::{
    Cursor, DocumentFields, DocumentId, DocumentPermission, Permission, PermissionLevel,
    PrincipalId, RecipientType, SortField, UserId,
};
use docshare_store::{DocumentStore, ErrorKind, Result};

use crate::fixtures::TestFixture;

/// Upper bound on pages fetched while draining a listing.
const MAX_PAGES: usize = 1_000;

fn ok<T>(result: Result<T>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => panic!("{}: {}", what, e),
    }
}

fn assert_kind<T: std::fmt::Debug>(result: Result<T>, kind: ErrorKind, what: &str) {
    match result {
        Ok(value) => panic!("{}: expected {:?}, got Ok({:?})", what, kind, value),
        Err(e) => assert_eq!(e.kind(), kind, "{}: {}", what, e),
    }
}

/// Drain a documents-by-principal listing from its beginning.
pub async fn drain_documents<S: DocumentStore>(
    store: &S,
    principal: PrincipalId,
    levels: &[PermissionLevel],
    sort: SortField,
    page_size: u32,
) -> Result<Vec<DocumentPermission>> {
    let mut cursor = Cursor::beginning(sort);
    let mut out = Vec::new();
    for _ in 0..MAX_PAGES {
        let page = store
            .list_documents_by_principal(principal, levels, cursor, page_size)
            .await?;
        if page.is_empty() {
            return Ok(out);
        }
        assert!(page.items.len() <= page_size as usize, "page over size");
        cursor = page.next_cursor;
        out.extend(page.items);
    }
    panic!("listing did not terminate after {} pages", MAX_PAGES);
}

/// Drain a permissions-on-document listing from its beginning.
pub async fn drain_permissions<S: DocumentStore>(
    store: &S,
    document: DocumentId,
    levels: &[PermissionLevel],
    sort: SortField,
    page_size: u32,
) -> Result<Vec<Permission>> {
    let mut cursor = Cursor::beginning(sort);
    let mut out = Vec::new();
    for _ in 0..MAX_PAGES {
        let page = store
            .list_permissions_on_document(document, levels, cursor, page_size)
            .await?;
        if page.is_empty() {
            return Ok(out);
        }
        assert!(page.items.len() <= page_size as usize, "page over size");
        cursor = page.next_cursor;
        out.extend(page.items);
    }
    panic!("listing did not terminate after {} pages", MAX_PAGES);
}

/// Creating a document grants its creator Owner.
pub async fn creator_is_owner<S: DocumentStore>(store: S) {
    let fixture = TestFixture::with_store(store);
    let doc = ok(fixture.document("owned").await, "create");

    let perm = ok(
        fixture
            .store
            .get_permission_of_principal_on_document(doc, fixture.owner.into())
            .await,
        "get owner permission",
    );
    assert_eq!(perm.level, PermissionLevel::Owner);
    assert_eq!(perm.recipient_type, RecipientType::User);
    assert_eq!(perm.created_by, PrincipalId::from(fixture.owner));

    let document = ok(fixture.store.get_document(doc).await, "get document");
    assert_eq!(document.name.as_deref(), Some("owned"));
    assert_eq!(document.created_at, document.last_modified_at);
    assert_eq!(perm.created_at, document.created_at);
}

/// Updates overwrite present fields only and move `last_modified_at`.
pub async fn update_overwrites_present_fields<S: DocumentStore>(store: S) {
    let fixture = TestFixture::with_store(store);
    let doc = ok(
        fixture
            .store
            .create_document(
                fixture.owner,
                DocumentFields::named("draft").with_description("first"),
            )
            .await,
        "create",
    );
    let before = ok(fixture.store.get_document(doc).await, "get");

    ok(
        fixture
            .store
            .update_document(doc, DocumentFields::new(None, Some("second")))
            .await,
        "update",
    );
    let after = ok(fixture.store.get_document(doc).await, "get");
    assert_eq!(after.name.as_deref(), Some("draft"));
    assert_eq!(after.description.as_deref(), Some("second"));
    assert!(after.last_modified_at >= before.last_modified_at);
    assert_eq!(after.created_at, before.created_at);

    assert_kind(
        fixture
            .store
            .update_document(DocumentId::new_v4(), DocumentFields::named("x"))
            .await,
        ErrorKind::NotFound,
        "update missing document",
    );
}

/// Upserting sets the level whatever the prior row, and keeps one row.
pub async fn upsert_is_idempotent<S: DocumentStore>(store: S) {
    let fixture = TestFixture::with_store(store);
    let doc = ok(fixture.document("shared").await, "create");
    let user = UserId::new_v4();

    for level in [
        PermissionLevel::Viewer,
        PermissionLevel::Editor,
        PermissionLevel::Editor,
    ] {
        ok(
            fixture.store.upsert_permission_user(user, doc, level).await,
            "upsert",
        );
        let perm = ok(
            fixture
                .store
                .get_permission_of_principal_on_document(doc, user.into())
                .await,
            "get",
        );
        assert_eq!(perm.level, level);
        assert_eq!(perm.created_by, PrincipalId::from(user));
    }

    let rows = ok(
        drain_permissions(&fixture.store, doc, &PermissionLevel::ALL, SortField::CreatedAt, 10)
            .await,
        "list",
    );
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows.iter()
            .filter(|p| p.recipient_id == PrincipalId::from(user))
            .count(),
        1
    );

    assert_kind(
        fixture
            .store
            .upsert_permission_user(user, DocumentId::new_v4(), PermissionLevel::Viewer)
            .await,
        ErrorKind::NotFound,
        "upsert on missing document",
    );
}

/// A user upsert never re-types a guest's permission.
pub async fn upsert_onto_guest_conflicts<S: DocumentStore>(store: S) {
    let fixture = TestFixture::with_store(store);
    let doc = ok(fixture.document("guarded").await, "create");
    let guest = ok(fixture.guest(doc, PermissionLevel::Viewer).await, "guest");

    assert_kind(
        fixture
            .store
            .upsert_permission_user(UserId::from_uuid(guest.0), doc, PermissionLevel::Editor)
            .await,
        ErrorKind::UniqueConflict,
        "upsert onto guest",
    );

    let perm = ok(
        fixture
            .store
            .get_permission_of_principal_on_document(doc, guest.into())
            .await,
        "get guest permission",
    );
    assert_eq!(perm.recipient_type, RecipientType::Guest);
    assert_eq!(perm.level, PermissionLevel::Viewer);
}

/// Guests are scoped to one document and outlive their permission.
pub async fn guest_lifecycle<S: DocumentStore>(store: S) {
    let fixture = TestFixture::with_store(store);
    let doc = ok(fixture.document("linked").await, "create");
    let guest = ok(fixture.guest(doc, PermissionLevel::Viewer).await, "guest");

    let record = ok(fixture.store.get_guest(guest).await, "get guest");
    assert_eq!(record.document_id, doc);
    assert_eq!(record.created_by, PrincipalId::from(fixture.owner));

    ok(
        fixture
            .store
            .update_permission_guest(guest, PermissionLevel::Editor)
            .await,
        "update guest",
    );
    let perm = ok(
        fixture
            .store
            .get_permission_of_principal_on_document(doc, guest.into())
            .await,
        "get guest permission",
    );
    assert_eq!(perm.level, PermissionLevel::Editor);
    assert_eq!(perm.created_by, PrincipalId::from(fixture.owner));

    ok(
        fixture
            .store
            .delete_permissions_principal(guest.into(), doc)
            .await,
        "delete guest permission",
    );
    assert_kind(
        fixture
            .store
            .get_permission_of_principal_on_document(doc, guest.into())
            .await,
        ErrorKind::NotFound,
        "guest permission after delete",
    );
    ok(fixture.store.get_guest(guest).await, "guest row survives");
    assert_kind(
        fixture
            .store
            .update_permission_guest(guest, PermissionLevel::Viewer)
            .await,
        ErrorKind::NotFound,
        "update guest without permission",
    );
    assert_kind(
        fixture
            .store
            .delete_permissions_principal(guest.into(), doc)
            .await,
        ErrorKind::NotFound,
        "delete twice",
    );

    assert_kind(
        fixture
            .store
            .create_guest(fixture.owner.into(), DocumentId::new_v4(), PermissionLevel::Viewer)
            .await,
        ErrorKind::NotFound,
        "guest on missing document",
    );
}

/// Deleting a document removes its permissions and guests.
pub async fn delete_cascades<S: DocumentStore>(store: S) {
    let fixture = TestFixture::with_store(store);
    let doc = ok(fixture.document("doomed").await, "create");
    let users = ok(
        fixture
            .share_with_users(doc, 2, PermissionLevel::Editor)
            .await,
        "share",
    );
    let guest = ok(fixture.guest(doc, PermissionLevel::Viewer).await, "guest");

    ok(fixture.store.delete_document(doc).await, "delete");

    assert_kind(fixture.store.get_document(doc).await, ErrorKind::NotFound, "get");
    assert_kind(
        fixture
            .store
            .list_permissions_on_document(
                doc,
                &PermissionLevel::ALL,
                Cursor::beginning(SortField::CreatedAt),
                10,
            )
            .await,
        ErrorKind::NotFound,
        "list after delete",
    );
    assert_kind(fixture.store.get_guest(guest).await, ErrorKind::NotFound, "guest");
    for user in users {
        let remaining = ok(
            drain_documents(
                &fixture.store,
                user.into(),
                &PermissionLevel::ALL,
                SortField::CreatedAt,
                10,
            )
            .await,
            "list user documents",
        );
        assert!(remaining.is_empty());
    }
    assert_kind(
        fixture.store.delete_document(doc).await,
        ErrorKind::NotFound,
        "delete twice",
    );
}

/// Bad listing arguments fail before any lookup.
pub async fn invalid_listing_arguments<S: DocumentStore>(store: S) {
    let fixture = TestFixture::with_store(store);
    let cursor = Cursor::beginning(SortField::CreatedAt);

    assert_kind(
        fixture
            .store
            .list_documents_by_principal(fixture.owner.into(), &[], cursor, 10)
            .await,
        ErrorKind::InvalidInput,
        "empty level filter",
    );
    assert_kind(
        fixture
            .store
            .list_documents_by_principal(fixture.owner.into(), &PermissionLevel::ALL, cursor, 0)
            .await,
        ErrorKind::InvalidInput,
        "zero page size",
    );
    // Validation wins over the missing document.
    assert_kind(
        fixture
            .store
            .list_permissions_on_document(DocumentId::new_v4(), &[], cursor, 10)
            .await,
        ErrorKind::InvalidInput,
        "empty level filter on missing document",
    );

    let page = ok(
        fixture
            .store
            .list_documents_by_principal(UserId::new_v4().into(), &PermissionLevel::ALL, cursor, 10)
            .await,
        "principal without permissions",
    );
    assert!(page.is_empty());
    assert_eq!(page.next_cursor, cursor);
}

/// Draining a listing yields every matching row once, in descending order.
pub async fn pagination_is_complete<S: DocumentStore>(
    store: S,
    rows: usize,
    page_size: u32,
    sort: SortField,
) {
    let fixture = TestFixture::with_store(store);
    let created: HashSet<DocumentId> = ok(fixture.documents(rows).await, "create")
        .into_iter()
        .collect();

    let listed = ok(
        drain_documents(
            &fixture.store,
            fixture.owner.into(),
            &PermissionLevel::ALL,
            sort,
            page_size,
        )
        .await,
        "drain",
    );
    assert_eq!(listed.len(), rows, "row count");

    let ids: HashSet<DocumentId> = listed.iter().map(|d| d.document.id).collect();
    assert_eq!(ids, created, "listed ids");

    let keys: Vec<_> = listed
        .iter()
        .map(|d| {
            let time = match sort {
                SortField::CreatedAt => d.document.created_at,
                SortField::LastModifiedAt => d.document.last_modified_at,
            };
            (time, d.document.id)
        })
        .collect();
    assert!(
        keys.windows(2).all(|w| w[0] > w[1]),
        "rows not in strictly descending order"
    );
}

/// Rows created after a cursor was issued are not returned when resuming.
pub async fn pagination_misses_forward<S: DocumentStore>(store: S) {
    let fixture = TestFixture::with_store(store);
    ok(fixture.documents(4).await, "create");

    let first = ok(
        fixture
            .store
            .list_documents_by_principal(
                fixture.owner.into(),
                &PermissionLevel::ALL,
                Cursor::beginning(SortField::CreatedAt),
                2,
            )
            .await,
        "first page",
    );
    assert_eq!(first.items.len(), 2);

    pause_past_current_micros();
    let late = ok(fixture.document("late").await, "create late");

    let rest = ok(
        fixture
            .store
            .list_documents_by_principal(
                fixture.owner.into(),
                &PermissionLevel::ALL,
                first.next_cursor,
                10,
            )
            .await,
        "second page",
    );
    assert_eq!(rest.items.len(), 2);
    assert!(rest.items.iter().all(|d| d.document.id != late));
}

/// Level filters restrict both listings.
pub async fn level_filter_applies<S: DocumentStore>(store: S) {
    let fixture = TestFixture::with_store(store);
    let doc = ok(fixture.document("mixed").await, "create");
    ok(
        fixture
            .share_with_users(doc, 3, PermissionLevel::Viewer)
            .await,
        "viewers",
    );
    ok(
        fixture
            .share_with_users(doc, 2, PermissionLevel::Editor)
            .await,
        "editors",
    );

    let viewers = ok(
        drain_permissions(
            &fixture.store,
            doc,
            &[PermissionLevel::Viewer],
            SortField::LastModifiedAt,
            2,
        )
        .await,
        "viewers",
    );
    assert_eq!(viewers.len(), 3);
    assert!(viewers.iter().all(|p| p.level == PermissionLevel::Viewer));

    let not_viewers = ok(
        drain_permissions(
            &fixture.store,
            doc,
            &[PermissionLevel::Owner, PermissionLevel::Editor],
            SortField::CreatedAt,
            10,
        )
        .await,
        "owner and editors",
    );
    assert_eq!(not_viewers.len(), 3);

    let owned = ok(
        drain_documents(
            &fixture.store,
            fixture.owner.into(),
            &[PermissionLevel::Viewer],
            SortField::CreatedAt,
            10,
        )
        .await,
        "owner as viewer",
    );
    assert!(owned.is_empty());
}

/// Sleep past the current microsecond so later rows sort strictly after.
fn pause_past_current_micros() {
    std::thread::sleep(std::time::Duration::from_millis(2));
}

/// Run every check, each against a fresh store from `make`.
pub async fn run_all<S, F>(mut make: F)
where
    S: DocumentStore,
    F: FnMut() -> S,
{
    creator_is_owner(make()).await;
    update_overwrites_present_fields(make()).await;
    upsert_is_idempotent(make()).await;
    upsert_onto_guest_conflicts(make()).await;
    guest_lifecycle(make()).await;
    delete_cascades(make()).await;
    invalid_listing_arguments(make()).await;
    pagination_is_complete(make(), 25, 10, SortField::CreatedAt).await;
    pagination_is_complete(make(), 7, 3, SortField::LastModifiedAt).await;
    pagination_misses_forward(make()).await;
    level_filter_applies(make()).await;
}

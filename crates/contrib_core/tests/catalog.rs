use contrib_core::db::open_db_in_memory;
use contrib_core::{
    CatalogRepository, NewContributor, NewProject, NewRepository, RepoError,
    SqliteCatalogRepository,
};

#[test]
fn project_upsert_is_keyed_by_name() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalogRepository::try_new(&conn).unwrap();

    let first = catalog.upsert_project(&NewProject::new("Alpha")).unwrap();
    let again = catalog.upsert_project(&NewProject::new("Alpha")).unwrap();
    let other = catalog.upsert_project(&NewProject::new("Beta")).unwrap();

    assert_eq!(first, again);
    assert_ne!(first, other);
}

#[test]
fn repository_keeps_its_original_project() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalogRepository::try_new(&conn).unwrap();
    let alpha = catalog.upsert_project(&NewProject::new("Alpha")).unwrap();
    let beta = catalog.upsert_project(&NewProject::new("Beta")).unwrap();

    let id = catalog
        .upsert_repository(&NewRepository::new("alpha", "core", alpha))
        .unwrap();
    let again = catalog
        .upsert_repository(&NewRepository::new("alpha", "core", beta))
        .unwrap();

    assert_eq!(id, again);
    let project_id: i64 = conn
        .query_row(
            "SELECT project_id FROM repositories WHERE id = ?1;",
            [id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(project_id, alpha);
}

#[test]
fn contributor_upsert_refreshes_profile() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalogRepository::try_new(&conn).unwrap();

    let id = catalog
        .upsert_contributor(&NewContributor::new("Ada", "ada", "https://a/1"))
        .unwrap();
    let again = catalog
        .upsert_contributor(&NewContributor::new("Ada Lovelace", "ada", "https://a/2"))
        .unwrap();

    assert_eq!(id, again);
    let (name, avatar_url): (String, String) = conn
        .query_row(
            "SELECT name, avatar_url FROM contributors WHERE id = ?1;",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(name, "Ada Lovelace");
    assert_eq!(avatar_url, "https://a/2");
}

#[test]
fn repository_for_unknown_project_fails_on_foreign_key() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalogRepository::try_new(&conn).unwrap();

    let err = catalog
        .upsert_repository(&NewRepository::new("ghost", "repo", 42))
        .unwrap_err();
    assert!(err.is_constraint_violation());
}

#[test]
fn blank_natural_keys_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalogRepository::try_new(&conn).unwrap();

    let err = catalog.upsert_project(&NewProject::new(" ")).unwrap_err();
    assert!(matches!(err, RepoError::CatalogValidation(e) if e.field == "projects.name"));

    let err = catalog
        .upsert_contributor(&NewContributor::new("Nobody", "", ""))
        .unwrap_err();
    assert!(matches!(err, RepoError::CatalogValidation(e) if e.field == "contributors.username"));
}

use confiteria_core::db::open_db_in_memory;
use confiteria_core::{
    CategoryCatalog, CsvProductRepository, OnSaleTokens, ProductListQuery, ProductRepository,
    ProductService, RawProductInput, ServiceError, SqliteProductRepository, ValidationError,
    EXPORT_HEADER,
};
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

const FIXED_NOW: i64 = 1_700_000_000_000;

fn fixed_clock() -> i64 {
    FIXED_NOW
}

fn raw(name: &str, price: &str, categories: &[&str], on_sale: &str) -> RawProductInput {
    RawProductInput {
        name: name.to_string(),
        price: Some(price.to_string()),
        categories: categories.iter().map(|label| (*label).to_string()).collect(),
        on_sale: on_sale.to_string(),
    }
}

fn csv_service(dir: &std::path::Path) -> ProductService<CsvProductRepository> {
    ProductService::new(
        CsvProductRepository::in_dir(dir, CategoryCatalog::default()),
        CategoryCatalog::default(),
        OnSaleTokens::default(),
    )
    .with_clock(fixed_clock)
}

fn names(service: &ProductService<impl ProductRepository>, query: &ProductListQuery) -> Vec<String> {
    service
        .list_products(query)
        .unwrap()
        .items
        .into_iter()
        .map(|product| product.name)
        .collect()
}

#[test]
fn trufa_submission_is_stored_and_exported() {
    let dir = tempfile::tempdir().unwrap();
    let service = csv_service(dir.path());

    let trufa = service
        .create_product(&raw("Trufa", "15.5", &["Chocolates", "Chocolates"], "Si"))
        .unwrap();
    assert_eq!(trufa.price.to_string(), "15.50");
    assert_eq!(trufa.categories, vec!["Chocolates".to_string()]);
    assert_eq!(trufa.created_at, FIXED_NOW);
    assert_eq!(trufa.updated_at, FIXED_NOW);

    let export = service.export_csv().unwrap();
    assert_eq!(
        export,
        format!(
            "{EXPORT_HEADER}\n{},Trufa,15.50,Chocolates,true,2023-11-14 22:13:20\n",
            trufa.id
        )
    );
}

#[test]
fn rejected_submission_leaves_storage_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let service = csv_service(dir.path());
    let kept = service
        .create_product(&raw("Alfajor", "3", &["Galletas"], "Si"))
        .unwrap();

    let err = service
        .create_product(&raw("", "5", &["Chocolates"], "Si"))
        .unwrap_err();
    match err {
        ServiceError::Validation(errors) => {
            assert_eq!(errors.errors(), &[ValidationError::InvalidName]);
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = service
        .update_product(kept.id, &raw("Alfajor", "1000", &["Galletas"], "Si"))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let page = service.list_products(&ProductListQuery::default()).unwrap();
    assert_eq!(page.items, vec![kept]);
}

#[test]
fn update_replaces_fields_and_refreshes_updated_at() {
    static NOW: AtomicI64 = AtomicI64::new(1_000);
    fn ticking_clock() -> i64 {
        NOW.load(Ordering::SeqCst)
    }

    let conn = open_db_in_memory().unwrap();
    let service = ProductService::new(
        SqliteProductRepository::try_new(&conn, CategoryCatalog::default()).unwrap(),
        CategoryCatalog::default(),
        OnSaleTokens::default(),
    )
    .with_clock(ticking_clock);

    let created = service
        .create_product(&raw("Chicle", "0.5", &["Gomas de mascar"], "Si"))
        .unwrap();

    NOW.store(2_000, Ordering::SeqCst);
    let updated = service
        .update_product(
            created.id,
            &raw("Chicle menta", "0.8", &["Gomas de mascar", "Caramelos"], "No"),
        )
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, 1_000);
    assert_eq!(updated.updated_at, 2_000);
    assert_eq!(updated.name, "Chicle menta");
    assert_eq!(
        updated.categories,
        vec!["Caramelos".to_string(), "Gomas de mascar".to_string()]
    );
    assert!(!updated.on_sale);
    assert_eq!(service.get_product(created.id).unwrap(), Some(updated));
}

#[test]
fn missing_targets_surface_as_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let service = csv_service(dir.path());
    let missing = Uuid::new_v4();

    assert!(matches!(
        service.update_product(missing, &raw("Trufa", "2", &["Chocolates"], "Si")),
        Err(ServiceError::NotFound(id)) if id == missing
    ));
    assert!(matches!(
        service.delete_product(missing),
        Err(ServiceError::NotFound(id)) if id == missing
    ));
    assert_eq!(service.get_product(missing).unwrap(), None);
}

#[test]
fn search_and_category_filters_apply_before_pagination() {
    let dir = tempfile::tempdir().unwrap();
    let service = csv_service(dir.path());
    for (name, category) in [
        ("Trufa", "Chocolates"),
        ("Caramelo de leche", "Caramelos"),
        ("Trufa blanca", "Chocolates"),
        ("Galleta de trufa", "Galletas"),
        ("Mani salado", "Salados"),
    ] {
        service
            .create_product(&raw(name, "2", &[category], "Si"))
            .unwrap();
    }

    let query = ProductListQuery {
        name_contains: Some("TRUFA".to_string()),
        ..ProductListQuery::default()
    };
    assert_eq!(
        names(&service, &query),
        vec!["Trufa", "Trufa blanca", "Galleta de trufa"]
    );

    let query = ProductListQuery {
        name_contains: Some("trufa".to_string()),
        category: Some("Chocolates".to_string()),
        ..ProductListQuery::default()
    };
    assert_eq!(names(&service, &query), vec!["Trufa", "Trufa blanca"]);

    let query = ProductListQuery {
        name_contains: Some("trufa".to_string()),
        page: 2,
        per_page: 2,
        ..ProductListQuery::default()
    };
    let page = service.list_products(&query).unwrap();
    assert_eq!(page.total_items, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "Galleta de trufa");
}

#[test]
fn page_past_the_end_is_empty_and_empty_store_has_one_page() {
    let dir = tempfile::tempdir().unwrap();
    let service = csv_service(dir.path());

    let page = service.list_products(&ProductListQuery::default()).unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total_items, 0);
    assert_eq!(page.total_pages, 1);

    service
        .create_product(&raw("Trufa", "2", &["Chocolates"], "Si"))
        .unwrap();
    let page = service
        .list_products(&ProductListQuery {
            page: 5,
            ..ProductListQuery::default()
        })
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.page, 5);
    assert_eq!(page.total_items, 1);
}

#[test]
fn delete_all_then_list_and_export_are_empty() {
    let dir = tempfile::tempdir().unwrap();
    let service = csv_service(dir.path());
    for name in ["Trufa", "Bombón", "Chocolatina"] {
        service
            .create_product(&raw(name, "4.25", &["Chocolates"], "No"))
            .unwrap();
    }

    service.delete_all_products().unwrap();

    let page = service.list_products(&ProductListQuery::default()).unwrap();
    assert!(page.items.is_empty());
    assert_eq!(service.export_csv().unwrap(), format!("{EXPORT_HEADER}\n"));
}

#[test]
fn delete_removes_exactly_one_product() {
    let dir = tempfile::tempdir().unwrap();
    let service = csv_service(dir.path());
    let gone = service
        .create_product(&raw("Chupete", "1", &["Caramelos"], "Si"))
        .unwrap();
    service
        .create_product(&raw("Mashmelo", "1", &["Mashmelos"], "Si"))
        .unwrap();

    service.delete_product(gone.id).unwrap();

    assert_eq!(
        names(&service, &ProductListQuery::default()),
        vec!["Mashmelo"]
    );
}

#[test]
fn configured_tokens_drive_on_sale_parsing() {
    let dir = tempfile::tempdir().unwrap();
    let service = ProductService::new(
        CsvProductRepository::in_dir(dir.path(), CategoryCatalog::default()),
        CategoryCatalog::default(),
        OnSaleTokens::new("Sí", "No").unwrap(),
    )
    .with_clock(fixed_clock);

    let product = service
        .create_product(&raw("Trufa", "2", &["Chocolates"], "Sí"))
        .unwrap();
    assert!(product.on_sale);

    let err = service
        .create_product(&raw("Trufa", "2", &["Chocolates"], "Si"))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(service.tokens().label(true), "Sí");
}

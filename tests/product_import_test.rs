mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use common::TestApp;
use pharmagebeya_api::{
    entities::product,
    errors::ServiceError,
    services::product_import::UploadedFile,
};
use rust_decimal_macros::dec;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

const HEADER: &str = "Product Name,Strength,Expiry Date,Price,Stock Quantity,Dosage Form\n";

fn catalog_csv(stock: i32) -> String {
    let mut csv = String::from(HEADER);
    let names = [
        "Amoxicillin", "Paracetamol", "Ibuprofen", "Metformin", "Omeprazole",
        "Cetirizine", "Azithromycin", "Losartan", "Ciprofloxacin",
    ];
    for name in names {
        csv.push_str(&format!("{},500mg,31/12/2027,12.50,{},Tablet\n", name, stock));
    }
    // row 11
    csv.push_str("Cough Mix,100ml,2027-06-30,,5,Tablet\n");
    csv
}

#[tokio::test]
async fn import_reports_bad_rows_and_keeps_the_rest() {
    let app = TestApp::new().await;
    app.seed_dosage_form("Tablet").await;
    let supplier = app.seed_supplier("Abay", None).await;

    let upload = UploadedFile::from_bytes("catalog.csv", catalog_csv(40).as_bytes()).unwrap();
    let summary = app
        .state
        .services
        .product_import
        .import(supplier.id, upload)
        .await
        .unwrap();

    assert_eq!(summary.created, 9);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.errors, vec!["Row 11: Missing required fields: price".to_string()]);
    assert_eq!(summary.message, "Imported 9 new products, Updated 0 existing products");

    let amox = product::Entity::find()
        .filter(product::Column::Name.eq("Amoxicillin"))
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(amox.supplier_id, supplier.id);
    assert_eq!(amox.stock_quantity, 40);
    assert_eq!(amox.price, dec!(12.50));
    assert_eq!(amox.expire_date, NaiveDate::from_ymd_opt(2027, 12, 31));
    assert!(!amox.product_id.is_empty());
}

#[tokio::test]
async fn reimport_updates_in_place() {
    let app = TestApp::new().await;
    app.seed_dosage_form("Tablet").await;
    let supplier = app.seed_supplier("Abay", None).await;
    let imports = &app.state.services.product_import;

    imports
        .import(supplier.id, UploadedFile::from_bytes("catalog.csv", catalog_csv(40).as_bytes()).unwrap())
        .await
        .unwrap();
    let first_ids: Vec<String> = product::Entity::find()
        .all(&*app.db)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.product_id)
        .collect();

    // new stock, price and expiry; Amoxicillin's expiry cell is left empty
    let mut second = String::from(HEADER);
    second.push_str("Amoxicillin,500mg,,14.75,15,Tablet\n");
    for name in [
        "Paracetamol", "Ibuprofen", "Metformin", "Omeprazole",
        "Cetirizine", "Azithromycin", "Losartan", "Ciprofloxacin",
    ] {
        second.push_str(&format!("{},500mg,30/06/2028,14.75,15,Tablet\n", name));
    }

    let summary = imports
        .import(supplier.id, UploadedFile::from_bytes("catalog.csv", second.as_bytes()).unwrap())
        .await
        .unwrap();

    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 9);
    assert!(summary.errors.is_empty());
    assert_eq!(summary.message, "Imported 0 new products, Updated 9 existing products");

    let products = product::Entity::find().all(&*app.db).await.unwrap();
    assert_eq!(products.len(), 9);
    assert!(products.iter().all(|p| first_ids.contains(&p.product_id)));
    for p in &products {
        assert_eq!(p.stock_quantity, 15, "{}", p.name);
        assert_eq!(p.price, dec!(14.75), "{}", p.name);
        if p.name == "Amoxicillin" {
            assert_eq!(p.expire_date, None);
        } else {
            assert_eq!(p.expire_date, NaiveDate::from_ymd_opt(2028, 6, 30), "{}", p.name);
        }
    }
}

#[tokio::test]
async fn workbook_upload_reads_typed_cells() {
    let app = TestApp::new().await;
    app.seed_dosage_form("Tablet").await;
    app.seed_dosage_form("Syrup").await;
    let supplier = app.seed_supplier("Abay", None).await;

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let date_format = Format::new().set_num_format("dd/mm/yyyy");
    for (col, title) in ["Product Name", "Strength", "Expiry Date", "Price", "Stock Quantity", "Dosage Form"]
        .iter()
        .enumerate()
    {
        sheet.write_string(0, col as u16, *title).unwrap();
    }

    // native date cell with numeric price and stock
    sheet.write_string(1, 0, "Amoxicillin").unwrap();
    sheet.write_string(1, 1, "500mg").unwrap();
    let expiry = ExcelDateTime::from_ymd(2027, 12, 31).unwrap();
    sheet.write_datetime_with_format(1, 2, &expiry, &date_format).unwrap();
    sheet.write_number(1, 3, 12.5).unwrap();
    sheet.write_number(1, 4, 40).unwrap();
    sheet.write_string(1, 5, "tablet").unwrap();

    // unformatted serial date, grouped stock typed as text
    sheet.write_string(2, 0, "Cough Syrup").unwrap();
    sheet.write_number(2, 1, 100).unwrap();
    sheet.write_number(2, 2, 46096).unwrap();
    sheet.write_number(2, 3, 85.25).unwrap();
    sheet.write_string(2, 4, "1,250").unwrap();
    sheet.write_string(2, 5, "Syrup").unwrap();

    // decimal comma is not a price
    sheet.write_string(3, 0, "Zinc").unwrap();
    sheet.write_string(3, 1, "20mg").unwrap();
    sheet.write_string(3, 3, "12,50").unwrap();
    sheet.write_number(3, 4, 3).unwrap();
    sheet.write_string(3, 5, "Tablet").unwrap();

    let bytes = workbook.save_to_buffer().unwrap();
    let summary = app
        .state
        .services
        .product_import
        .import(supplier.id, UploadedFile::from_bytes("catalog.xlsx", &bytes).unwrap())
        .await
        .unwrap();

    assert_eq!(summary.created, 2);
    assert_eq!(summary.errors, vec!["Row 4: Invalid price '12,50'".to_string()]);

    let by_name = |name: &'static str| {
        let db = app.db.clone();
        async move {
            product::Entity::find()
                .filter(product::Column::Name.eq(name))
                .one(&*db)
                .await
                .unwrap()
                .unwrap()
        }
    };

    let amox = by_name("Amoxicillin").await;
    assert_eq!(amox.expire_date, NaiveDate::from_ymd_opt(2027, 12, 31));
    assert_eq!(amox.price, dec!(12.50));
    assert_eq!(amox.stock_quantity, 40);

    let syrup = by_name("Cough Syrup").await;
    assert_eq!(syrup.strength, "100");
    assert_eq!(syrup.expire_date, NaiveDate::from_ymd_opt(2026, 3, 15));
    assert_eq!(syrup.price, dec!(85.25));
    assert_eq!(syrup.stock_quantity, 1250);
}

#[tokio::test]
async fn same_product_for_another_supplier_is_a_new_row() {
    let app = TestApp::new().await;
    app.seed_dosage_form("Tablet").await;
    let a = app.seed_supplier("Abay", None).await;
    let b = app.seed_supplier("Bekele", None).await;
    let imports = &app.state.services.product_import;
    let csv = format!("{}Amoxicillin,500mg,,12.50,10,tablet\n", HEADER);

    for supplier in [&a, &b] {
        let summary = imports
            .import(supplier.id, UploadedFile::from_bytes("one.csv", csv.as_bytes()).unwrap())
            .await
            .unwrap();
        assert_eq!(summary.created, 1);
    }

    assert_eq!(product::Entity::find().count(&*app.db).await.unwrap(), 2);
}

#[tokio::test]
async fn missing_fields_and_blank_rows() {
    let app = TestApp::new().await;
    app.seed_dosage_form("Tablet").await;
    let supplier = app.seed_supplier("Abay", None).await;
    let csv = format!(
        "{}Amoxicillin,,,12.50,,Tablet\n,,,,,\nZinc,20mg,soon,1.50,3,Tablet\nCough Mix,100ml,,8.25,5,Lozenge\n",
        HEADER
    );

    let summary = app
        .state
        .services
        .product_import
        .import(supplier.id, UploadedFile::from_bytes("rows.csv", csv.as_bytes()).unwrap())
        .await
        .unwrap();

    assert_eq!(summary.created, 0);
    assert_eq!(
        summary.errors,
        vec![
            "Row 2: Missing required fields: strength, stock_quantity".to_string(),
            "Row 4: Invalid date format 'soon'".to_string(),
            "Row 5: Invalid dosage form 'Lozenge'".to_string(),
        ]
    );
}

#[tokio::test]
async fn temp_file_is_removed_after_success_and_failure() {
    let app = TestApp::new().await;
    app.seed_dosage_form("Tablet").await;
    let supplier = app.seed_supplier("Abay", None).await;
    let imports = &app.state.services.product_import;

    let upload = UploadedFile::from_bytes("catalog.csv", catalog_csv(1).as_bytes()).unwrap();
    let path = upload.path().to_path_buf();
    assert!(path.exists());
    imports.import(supplier.id, upload).await.unwrap();
    assert!(!path.exists());

    let broken = UploadedFile::from_bytes("catalog.xlsx", b"this is not a workbook").unwrap();
    let path = broken.path().to_path_buf();
    let err = imports.import(supplier.id, broken).await.unwrap_err();
    assert_matches!(err, ServiceError::ImportError(_));
    assert!(!path.exists());
}

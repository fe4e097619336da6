use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use roster_recon::cleanup::cleanup_outputs;
use roster_recon::dataset::{read_csv_as_strings, string_values};
use roster_recon::schema::{employee, rules, sale};
use roster_recon::{GenderDetector, Pipeline, PipelineConfig, PipelineError};

const EMPLOYEES: &str = "\
Employee ID,Name,Gender,Age,Birthdate,Email,Phone,Hire Date,Contract Type,Salary,Termination Date
EMP1,John Doe,Female,44,1980-01-01,JOHN@EXAMPLE.COM,(555) 123-4567,2021-01-01,Full-time,5000,
EMP2,Jane Smith,Female,34,1990-05-05,not-an-email,123,2022-01-02,Part-time,4000,2021-06-01
,Nobody Known,Male,50,1970-01-01,nobody@example.com,5551112222,2010-01-01,Full-time,1000,
EMP3,Alice Brown,Female,39,1985-03-03,alice@example.com,+1 555 987 6543,2019-06-01,Temporary,3000,2023-06-01
";

const SALES: &str = "\
Sale ID,Product ID,Seller First Name,Seller Last Name,Seller Employee ID,Buyer Name,Sale Date,Quantity,Unit Price,Total Price,Sale Status
SALE1,PROD1,John,Doe,EMP1,Buyer A,2022-01-01,2,10.0,20.0,Completed
SALE2,PROD2,Jane,Smith,EMP2,Buyer B,2022-01-01,1,5.0,5.0,Pending
SALE3,PROD3,David,Brown,EMP9,Buyer C,2023-03-03,3,10.0,31.0,Cancelled
SALE4,PROD4,Alice,Brown,EMP3,Buyer D,2018-01-01,1,7.5,7.5,Pending
";

fn config_in(dir: &Path) -> PipelineConfig {
    let inputs = dir.join("inputs");
    fs::create_dir_all(&inputs).unwrap();
    fs::write(inputs.join("employee_data.csv"), EMPLOYEES).unwrap();
    fs::write(inputs.join("sales_data.csv"), SALES).unwrap();

    PipelineConfig {
        employee_data_path: inputs.join("employee_data.csv"),
        sales_data_path: inputs.join("sales_data.csv"),
        cleaned_employee_data_path: dir.join("outputs/employee_data_clean.csv"),
        cleaned_sales_data_path: dir.join("outputs/sales_data_clean.csv"),
        report_output_dir: dir.join("reports"),
        log_level: "debug".into(),
    }
}

fn now() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

#[test]
fn full_run_reassigns_and_reports() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let pipeline = Pipeline::new(config.clone(), GenderDetector::builtin().unwrap()).unwrap();
    let out = pipeline.run(now()).unwrap();

    for path in config.output_paths() {
        assert!(path.is_file(), "missing output {}", path.display());
    }

    // row without an id is gone, age is dropped
    assert_eq!(out.employees.height(), 3);
    assert!(out.employees.column(employee::AGE).is_err());
    let phones = string_values(&out.employees, employee::PHONE).unwrap();
    assert_eq!(phones[0].as_deref(), Some("5551234567"));
    assert_eq!(phones[1].as_deref(), Some("0000000000"));
    assert_eq!(phones[2].as_deref(), Some("5559876543"));
    let genders = string_values(&out.employees, employee::GENDER).unwrap();
    assert_eq!(genders[0].as_deref(), Some("Male"));

    // SALE2 predates EMP2's hire and moves to EMP1, the first employee in
    // table order hired by then; SALE4 predates everyone and stays put
    assert_eq!(out.reassignments.len(), 1);
    assert_eq!(out.reassignments[0].to, "EMP1");
    let sellers = string_values(&out.sales, sale::SELLER_EMPLOYEE_ID).unwrap();
    assert_eq!(
        sellers.iter().map(|s| s.as_deref()).collect::<Vec<_>>(),
        vec![Some("EMP1"), Some("EMP1"), Some("EMP9"), Some("EMP3")]
    );
    assert_eq!(out.sales_report.cleaning.sales_before_hire, 2);
    assert_eq!(out.sales_report.cleaning.unresolved, 1);

    let written = read_csv_as_strings(&config.cleaned_sales_data_path).unwrap();
    let sellers = string_values(&written, sale::SELLER_EMPLOYEE_ID).unwrap();
    assert_eq!(sellers[1].as_deref(), Some("EMP1"));

    // EMP2 terminated before hire; every sale has a false status flag
    assert_eq!(out.valid_employees.len(), 2);
    assert_eq!(out.valid_sales.len(), 0);
    assert_eq!(out.employees_report.total_valid, 2);
    assert_eq!(out.sales_report.total_valid, 0);
    assert_eq!(out.sales_report.validation_rate, 0.0);
    // SALE3's total does not add up
    assert_eq!(
        out.sale_validation
            .passing_count(&rules::SALE_QUALITY_CHECKS)
            .unwrap(),
        3
    );
    assert_eq!(out.employees_report.terminated_before_hire, 1);

    let stats = &out.relations;
    assert_eq!(stats.employees_without_sales, 1);
    assert_eq!(stats.employees_with_sales, 2);
    assert_eq!(stats.invalid_employee_ids_in_sales, 1);
    assert_eq!(stats.invalid_names_in_sales, 1);
    assert_eq!(stats.sales_with_valid_employee, 3);
    // the real reassignment count, not a constant zero
    assert_eq!(stats.sales_reassigned, 1);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(config.relations_report_path()).unwrap())
            .unwrap();
    assert_eq!(json["sales_reassigned"], 1);
}

#[test]
fn clean_removes_previous_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    Pipeline::new(config.clone(), GenderDetector::builtin().unwrap())
        .unwrap()
        .run(now())
        .unwrap();

    let stats = cleanup_outputs(&config.output_paths());
    assert_eq!(stats.files_deleted, 5);
    assert!(!config.cleaned_sales_data_path.exists());
}

#[test]
fn missing_source_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.sales_data_path = dir.path().join("inputs/nope.csv");
    let pipeline = Pipeline::new(config.clone(), GenderDetector::builtin().unwrap()).unwrap();

    match pipeline.run(now()) {
        Err(PipelineError::SourceNotFound(path)) => assert_eq!(path, config.sales_data_path),
        other => panic!("expected SourceNotFound, got {other:?}"),
    }
    assert!(!config.cleaned_employee_data_path.exists());
}

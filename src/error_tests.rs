use super::*;

#[test]
fn http_status_mapping() {
    assert_eq!(AppError::user("bad_input", "oops").http_status(), 400);
    assert_eq!(AppError::not_found("not_found", "missing").http_status(), 404);
    assert_eq!(AppError::unprocessable("parse_error", "bad header").http_status(), 422);
    assert_eq!(AppError::internal("internal", "panic").http_status(), 500);
}

#[test]
fn dash_error_mapping() {
    let e: AppError = DashError::SourceNotFound { locator: "data/x.csv".into() }.into();
    assert_eq!(e.http_status(), 404);
    assert_eq!(e.code_str(), "source_not_found");
    assert!(e.message().contains("data/x.csv"));

    let e: AppError = DashError::missing_columns("data/y.csv", vec!["Country Code".into(), "2001".into()]).into();
    assert_eq!(e.http_status(), 422);
    assert_eq!(e.code_str(), "parse_error");
    assert!(e.message().contains("Country Code"));
    assert!(e.message().contains("2001"));

    let e: AppError = DashError::UnknownPage("nope".into()).into();
    assert_eq!(e.http_status(), 404);

    let e: AppError = DashError::InvalidPage("indicator 'x' declared twice".into()).into();
    assert_eq!(e.http_status(), 400);
}

#[test]
fn app_error_serializes_with_type_tag() {
    let e = AppError::not_found("source_not_found", "source not found: a.csv");
    let v = serde_json::to_value(&e).unwrap();
    assert_eq!(v["type"], "not_found");
    assert_eq!(v["code"], "source_not_found");
    let back: AppError = serde_json::from_value(v).unwrap();
    assert_eq!(back, e);
}

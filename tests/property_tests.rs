/// Property-based tests using proptest
/// Tests invariants and properties that should hold for all inputs
use proptest::prelude::*;
use rust_leads_api::csv_transfer::{export_leads, parse_csv};
use rust_leads_api::models::{Lead, LeadStatus, LeadTimeline, PropertyType};
use rust_leads_api::query_builder::{build_query, LeadFilter, LeadFilterSql, ListLeadsParams};
use rust_leads_api::validation::{is_valid_email, is_valid_phone, split_tags, validate_create};
use serde_json::json;

// Property: Email validation should never panic
proptest! {
    #[test]
    fn email_validation_never_panics(email in "\\PC*") {
        let _ = is_valid_email(&email);
    }

    #[test]
    fn simple_addresses_are_valid(
        local in "[a-z][a-z0-9]{0,9}",
        domain in "[a-z]{1,10}",
        tld in "[a-z]{2,4}"
    ) {
        let email = format!("{}@{}.{}", local, domain, tld);
        prop_assert!(is_valid_email(&email));
    }

    #[test]
    fn addresses_without_at_are_invalid(email in "[a-z0-9.]{1,20}") {
        prop_assert!(!is_valid_email(&email));
    }
}

// Property: Phone validation accepts exactly ten digits
proptest! {
    #[test]
    fn phone_validation_never_panics(phone in "\\PC*") {
        let _ = is_valid_phone(&phone);
    }

    #[test]
    fn ten_digits_accepted(phone in "[0-9]{10}") {
        prop_assert!(is_valid_phone(&phone));
    }

    #[test]
    fn other_digit_counts_rejected(phone in "[0-9]{0,9}|[0-9]{11,15}") {
        prop_assert!(!is_valid_phone(&phone));
    }

    #[test]
    fn formatted_phones_rejected(a in "[0-9]{3}", b in "[0-9]{3}", c in "[0-9]{4}") {
        let phone = format!("{}-{}-{}", a, b, c);
        prop_assert!(!is_valid_phone(&phone));
    }
}

// Property: Validation and query building never panic on arbitrary input
proptest! {
    #[test]
    fn validate_create_never_panics(name in "\\PC*", email in "\\PC*", phone in "\\PC*", city in "\\PC*") {
        let payload = json!({
            "name": name,
            "email": email,
            "phone": phone,
            "city": city,
            "propertyType": "Condo",
            "status": "New",
            "timeline": "ASAP"
        });
        let _ = validate_create(&payload);
    }

    #[test]
    fn page_window_always_positive(page in "\\PC*") {
        let params = ListLeadsParams { page: Some(page), ..Default::default() };
        let query = build_query(&params).unwrap();
        prop_assert!(query.window.page >= 1);
        prop_assert!(query.window.offset() >= 0);
        prop_assert_eq!(query.window.offset() % 10, 0);
    }

    #[test]
    fn rendered_filter_has_one_param_per_placeholder(
        query in proptest::option::of("\\PC{1,20}"),
        city in proptest::option::of("[A-Za-z ]{2,12}"),
    ) {
        let filter = LeadFilter { query, city, ..Default::default() };
        let (sql, params) = LeadFilterSql::new(&filter, 0).build();
        for idx in 1..=params.len() {
            let placeholder = format!("${}", idx);
            prop_assert!(sql.contains(&placeholder));
        }
        let next_placeholder = format!("${}", params.len() + 1);
        prop_assert!(!sql.contains(&next_placeholder));
    }

    #[test]
    fn split_tags_yields_trimmed_non_empty(raw in "[a-z ;]{0,40}") {
        for tag in split_tags(&raw) {
            prop_assert!(!tag.is_empty());
            prop_assert_eq!(tag.trim(), tag.as_str());
            prop_assert!(!tag.contains(';'));
        }
    }
}

// Property: exported text fields read back unchanged
proptest! {
    #[test]
    fn exported_notes_parse_back(
        notes in "[ -~\n]{0,30}[!-~][ -~\n]{0,29}",
        name in "[A-Za-z][A-Za-z ,\"]{0,18}[A-Za-z]"
    ) {
        let lead = Lead {
            id: uuid::Uuid::new_v4(),
            name: name.clone(),
            email: "prop@example.com".to_string(),
            phone: None,
            city: "Austin".to_string(),
            property_type: PropertyType::Land,
            status: LeadStatus::Lost,
            timeline: LeadTimeline::SixPlusMonths,
            notes: Some(notes.clone()),
            tags: vec![],
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let csv = export_leads(&[lead]).unwrap();
        let rows = parse_csv(&csv).unwrap();
        prop_assert_eq!(rows.len(), 1);
        prop_assert_eq!(rows[0]["name"].as_str(), Some(name.as_str()));
        prop_assert_eq!(rows[0]["notes"].as_str(), Some(notes.as_str()));
    }
}

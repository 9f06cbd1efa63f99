use fp_orders::*;
use fp_schemas::{AddressType, DeliveryAddress, UserRole};

#[test]
fn scenario_student_in_hostel_gets_hostel_address() {
    let raw = r#"{
        "role": "STUDENT",
        "fullName": "Asha Rao",
        "branch": "CSE",
        "semester": "5",
        "classNumber": "C-12",
        "block": "Boys Hostel A",
        "roomLocation": "301",
        "phoneNumber": "9876543210"
    }"#;
    let form: ProfileForm = serde_json::from_str(raw).unwrap();
    let p = form.into_profile().unwrap();

    assert_eq!(p.role, UserRole::Student);
    assert_eq!(p.address.address_type, Some(AddressType::Hostel));
    assert_eq!(p.address.hostel_name.as_deref(), Some("Boys Hostel A"));
    assert_eq!(p.address.building_name, None);
    assert_eq!(p.address.landmark.as_deref(), Some("Semester 5"));
    assert_eq!(
        format_delivery_address(&p.address),
        "Boys Hostel A, Room 301, Semester 5"
    );
}

#[test]
fn scenario_faculty_form_maps_to_department() {
    let raw = r#"{
        "role": "FACULTY",
        "fullName": "Dr. Test Faculty",
        "department": "Computer Science",
        "officeNumber": "204",
        "block": "Main Block",
        "roomLocation": "Second floor",
        "phoneNumber": "+91 9876543212"
    }"#;
    let form: ProfileForm = serde_json::from_str(raw).unwrap();
    let p = form.into_profile().unwrap();

    assert_eq!(p.role, UserRole::Faculty);
    assert_eq!(
        format_delivery_address(&p.address),
        "Computer Science, Cabin 204, Second floor"
    );
}

#[test]
fn scenario_short_phone_is_rejected() {
    let form = ProfileForm::Others(OthersForm {
        full_name: "Visitor".to_string(),
        block: "Library".to_string(),
        room_location: "Desk 3".to_string(),
        phone_number: "12345".to_string(),
    });
    let err = form.into_profile().unwrap_err();
    assert_eq!(err.to_string(), "phoneNumber must be at least 10 characters");
}

#[test]
fn scenario_normalize_drops_fields_of_other_types() {
    let input = DeliveryAddress {
        address_type: Some(AddressType::Custom),
        hostel_name: Some("Old Hostel".to_string()),
        building_name: Some(" Admin Block ".to_string()),
        floor_number: Some("2".to_string()),
        landmark: Some("".to_string()),
        ..Default::default()
    };
    let out = normalize_address(input);
    assert_eq!(out.hostel_name, None);
    assert_eq!(out.building_name.as_deref(), Some("Admin Block"));
    assert_eq!(out.landmark, None);
    assert_eq!(format_delivery_address(&out), "Admin Block, Floor 2");
}

#[test]
fn scenario_empty_address_formats_as_na() {
    assert_eq!(format_delivery_address(&DeliveryAddress::default()), "N/A");
}

use fp_schemas::{AddressType, DeliveryAddress, UserRole};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One-line rendering of a delivery address for reports and delivery lists.
pub fn format_delivery_address(addr: &DeliveryAddress) -> String {
    let mut parts: Vec<String> = Vec::new();

    match (addr.address_type, &addr.hostel_name, &addr.department_name) {
        (Some(AddressType::Hostel), Some(hostel), _) => {
            parts.push(hostel.clone());
            if let Some(room) = &addr.room_number {
                parts.push(format!("Room {room}"));
            }
        }
        (Some(AddressType::Department), _, Some(dept)) => {
            parts.push(dept.clone());
            if let Some(cabin) = &addr.cabin_number {
                parts.push(format!("Cabin {cabin}"));
            }
        }
        _ => {
            if let Some(building) = &addr.building_name {
                parts.push(building.clone());
                if let Some(floor) = &addr.floor_number {
                    parts.push(format!("Floor {floor}"));
                }
            }
        }
    }

    if let Some(landmark) = &addr.landmark {
        parts.push(landmark.clone());
    }

    if parts.is_empty() {
        "N/A".to_string()
    } else {
        parts.join(", ")
    }
}

fn clean(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Keep only the fields that belong to the address type. Used by the
/// address editor where the client may send stale fields of another type.
pub fn normalize_address(input: DeliveryAddress) -> DeliveryAddress {
    let kind = input.address_type;
    let keep = |want: AddressType, v: Option<String>| {
        if kind == Some(want) {
            clean(v)
        } else {
            None
        }
    };

    DeliveryAddress {
        address_type: kind,
        hostel_name: keep(AddressType::Hostel, input.hostel_name),
        room_number: keep(AddressType::Hostel, input.room_number),
        department_name: keep(AddressType::Department, input.department_name),
        cabin_number: keep(AddressType::Department, input.cabin_number),
        building_name: keep(AddressType::Custom, input.building_name),
        floor_number: keep(AddressType::Custom, input.floor_number),
        landmark: clean(input.landmark),
        notes: clean(input.notes),
    }
}

// ---------------------------------------------------------------------------
// Profile setup forms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentForm {
    pub full_name: String,
    pub branch: String,
    pub semester: String,
    pub class_number: String,
    pub block: String,
    pub room_location: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyForm {
    pub full_name: String,
    pub department: String,
    pub office_number: String,
    pub block: String,
    pub room_location: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OthersForm {
    pub full_name: String,
    pub block: String,
    pub room_location: String,
    pub phone_number: String,
}

/// First-login profile form, discriminated by the `role` the user picks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileForm {
    Student(StudentForm),
    Faculty(FacultyForm),
    Others(OthersForm),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileRejection {
    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },
}

/// Validated profile: user columns plus the address to save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub phone: String,
    pub role: UserRole,
    pub address: DeliveryAddress,
}

fn require(field: &'static str, value: &str, min: usize) -> Result<(), ProfileRejection> {
    if value.trim().chars().count() < min {
        return Err(ProfileRejection::TooShort { field, min });
    }
    Ok(())
}

fn some(s: &str) -> Option<String> {
    clean(Some(s.to_string()))
}

impl ProfileForm {
    pub fn role(&self) -> UserRole {
        match self {
            ProfileForm::Student(_) => UserRole::Student,
            ProfileForm::Faculty(_) => UserRole::Faculty,
            ProfileForm::Others(_) => UserRole::Others,
        }
    }

    /// Validate field lengths and map the form onto the address model.
    ///
    /// Students living in a block whose name mentions "hostel" get a Hostel
    /// address; every other student gets a Custom one.
    pub fn into_profile(self) -> Result<Profile, ProfileRejection> {
        let role = self.role();
        match self {
            ProfileForm::Student(f) => {
                require("fullName", &f.full_name, 2)?;
                require("branch", &f.branch, 1)?;
                require("semester", &f.semester, 1)?;
                require("classNumber", &f.class_number, 1)?;
                require("block", &f.block, 1)?;
                require("roomLocation", &f.room_location, 1)?;
                require("phoneNumber", &f.phone_number, 10)?;

                let is_hostel = f.block.to_lowercase().contains("hostel");
                let address = DeliveryAddress {
                    address_type: Some(if is_hostel {
                        AddressType::Hostel
                    } else {
                        AddressType::Custom
                    }),
                    hostel_name: if is_hostel { some(&f.block) } else { None },
                    room_number: some(&f.room_location),
                    department_name: some(&f.branch),
                    cabin_number: some(&f.class_number),
                    building_name: if is_hostel { None } else { some(&f.block) },
                    floor_number: None,
                    landmark: some(&format!("Semester {}", f.semester.trim())),
                    notes: None,
                };
                Ok(Profile {
                    name: f.full_name.trim().to_string(),
                    phone: f.phone_number.trim().to_string(),
                    role,
                    address,
                })
            }
            ProfileForm::Faculty(f) => {
                require("fullName", &f.full_name, 2)?;
                require("department", &f.department, 1)?;
                require("officeNumber", &f.office_number, 1)?;
                require("block", &f.block, 1)?;
                require("roomLocation", &f.room_location, 1)?;
                require("phoneNumber", &f.phone_number, 10)?;

                let address = DeliveryAddress {
                    address_type: Some(AddressType::Department),
                    department_name: some(&f.department),
                    cabin_number: some(&f.office_number),
                    building_name: some(&f.block),
                    landmark: some(&f.room_location),
                    ..Default::default()
                };
                Ok(Profile {
                    name: f.full_name.trim().to_string(),
                    phone: f.phone_number.trim().to_string(),
                    role,
                    address,
                })
            }
            ProfileForm::Others(f) => {
                require("fullName", &f.full_name, 2)?;
                require("block", &f.block, 1)?;
                require("roomLocation", &f.room_location, 1)?;
                require("phoneNumber", &f.phone_number, 10)?;

                let address = DeliveryAddress {
                    address_type: Some(AddressType::Custom),
                    building_name: some(&f.block),
                    landmark: some(&f.room_location),
                    ..Default::default()
                };
                Ok(Profile {
                    name: f.full_name.trim().to_string(),
                    phone: f.phone_number.trim().to_string(),
                    role,
                    address,
                })
            }
        }
    }
}

//! Field validation for every form. Each validator returns the full set of field errors so
//! the page can redisplay all problems at once.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{Datelike, NaiveDate};
use regex::Regex;

use super::{ProfileInput, RegisterStepInput};

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{3,20}$").expect("username pattern is valid"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[89]\d{7}$").expect("phone pattern is valid"));

pub const MIN_AGE: i32 = 13;
pub const MAX_MESSAGE_CHARS: usize = 500;
pub const MAX_BIO_CHARS: usize = 160;
pub const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 4] = [".png", ".jpg", ".jpeg", ".webp"];

const USERNAME_MSG: &str = "Username must be 3–20 characters (letters, numbers, underscore).";
const DISPLAY_NAME_MSG: &str = "Display name must be 2–40 characters.";
const EMAIL_MSG: &str = "Please enter a valid email address.";
const TOO_YOUNG_MSG: &str = "You must be at least 13 years old.";
const BAD_DATE_MSG: &str = "Please use a valid date.";
const PICTURE_TYPE_MSG: &str = "Profile picture must be PNG, JPG, or WEBP.";
const CROPPED_TYPE_MSG: &str = "Cropped image must be PNG, JPG, or WEBP.";
const CROPPED_INVALID_MSG: &str = "Cropped image is invalid.";
const MISMATCH_MSG: &str = "Passwords do not match.";

/// Field name to message. Templates read missing fields as "".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> &str {
        self.0.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Whole years between `dob` and `today`, counting the birthday itself as complete.
pub fn calculate_age(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut years = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    years
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

pub fn has_allowed_image_extension(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    ALLOWED_IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(ext))
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn length_between(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&char_len(value))
}

/// Every failed complexity rule, each sentence prefixed by `label`, joined by spaces.
fn password_complexity(password: &str, label: &str) -> Option<String> {
    let mut problems = Vec::new();
    if char_len(password) < 8 {
        problems.push(format!("{label} must be at least 8 characters."));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        problems.push(format!("{label} must include an uppercase letter."));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        problems.push(format!("{label} must include a lowercase letter."));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        problems.push(format!("{label} must include a number."));
    }
    (!problems.is_empty()).then(|| problems.join(" "))
}

fn birth_date_error(raw: &str, today: NaiveDate) -> Option<&'static str> {
    match parse_date(raw) {
        Some(dob) if calculate_age(dob, today) < MIN_AGE => Some(TOO_YOUNG_MSG),
        Some(_) => None,
        None => Some(BAD_DATE_MSG),
    }
}

pub fn validate_login(identifier: &str, password: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if identifier.trim().is_empty() {
        errors.insert("identifier", "Please enter your username or email.");
    }
    if password.is_empty() {
        errors.insert("password", "Please enter your password.");
    }
    errors
}

pub fn validate_register_step(
    step: u8,
    input: &RegisterStepInput,
    today: NaiveDate,
) -> FieldErrors {
    let mut errors = FieldErrors::new();

    match step {
        1 => {
            if !is_valid_username(input.username.trim()) {
                errors.insert("username", USERNAME_MSG);
            }
            if !length_between(input.display_name.trim(), 2, 40) {
                errors.insert("display_name", DISPLAY_NAME_MSG);
            }
        }
        2 => {
            if !is_valid_email(&normalize_email(&input.email)) {
                errors.insert("email", EMAIL_MSG);
            }
        }
        3 => {
            if let Some(message) = password_complexity(&input.password, "Password") {
                errors.insert("password", message);
            }
        }
        4 => {
            let age = input.age.trim();
            if age.is_empty() || !age.chars().all(|c| c.is_ascii_digit()) {
                errors.insert("age", "Please enter your age in numbers.");
            } else if age.parse::<u64>().is_ok_and(|years| years < MIN_AGE as u64) {
                errors.insert("age", TOO_YOUNG_MSG);
            }

            let dob = input.date_of_birth.trim();
            if dob.is_empty() {
                errors.insert("date_of_birth", "Please enter your birthday.");
            } else if let Some(message) = birth_date_error(dob, today) {
                errors.insert("date_of_birth", message);
            }
        }
        5 => {
            if let Some(filename) = input.picture_filename.as_deref()
                && !filename.is_empty()
                && !has_allowed_image_extension(filename)
            {
                errors.insert("profile_picture", PICTURE_TYPE_MSG);
            }
        }
        _ => {}
    }

    errors
}

/// Decoded size of a `data:image/...;base64,` URL, or the message describing why it is
/// unusable.
pub fn check_cropped_avatar(data_url: &str) -> Result<Vec<u8>, &'static str> {
    if !data_url.starts_with("data:image/") {
        return Err(CROPPED_TYPE_MSG);
    }
    let Some((header, encoded)) = data_url.split_once(',') else {
        return Err(CROPPED_INVALID_MSG);
    };
    if !["image/png", "image/jpeg", "image/webp"]
        .iter()
        .any(|mime| header.contains(mime))
    {
        return Err(CROPPED_TYPE_MSG);
    }
    let raw = STANDARD
        .decode(encoded.trim())
        .map_err(|_| CROPPED_INVALID_MSG)?;
    if raw.len() > MAX_AVATAR_BYTES {
        return Err("Profile picture must be under 2MB.");
    }
    Ok(raw)
}

pub fn validate_profile_update(input: &ProfileInput, today: NaiveDate) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let username = input.username.trim();
    if !username.is_empty() && !is_valid_username(username) {
        errors.insert("username", USERNAME_MSG);
    }
    let display_name = input.display_name.trim();
    if !display_name.is_empty() && !length_between(display_name, 2, 40) {
        errors.insert("display_name", DISPLAY_NAME_MSG);
    }
    let location = input.location.trim();
    if !location.is_empty() && !length_between(location, 2, 20) {
        errors.insert("location", "Location must be 2–20 characters.");
    }
    let phone = input.phone.trim();
    if !phone.is_empty() && !PHONE_RE.is_match(phone) {
        errors.insert("phone", "Phone must be 8 digits and start with 8 or 9.");
    }
    if char_len(input.bio.trim()) > MAX_BIO_CHARS {
        errors.insert("bio", "Bio must be 160 characters or less.");
    }
    let privacy = input.privacy.trim();
    if !privacy.is_empty() && !matches!(privacy, "public" | "private") {
        errors.insert("privacy", "Please choose a privacy setting.");
    }
    let gender = input.gender.trim();
    if !gender.is_empty() && !matches!(gender, "male" | "female") {
        errors.insert("gender", "Please choose male or female.");
    }
    let age_group = input.age_group.trim();
    if !age_group.is_empty() && !matches!(age_group, "youth" | "senior") {
        errors.insert("age_group", "Please choose youth or senior.");
    }
    let dob = input.date_of_birth.trim();
    if !dob.is_empty()
        && let Some(message) = birth_date_error(dob, today)
    {
        errors.insert("date_of_birth", message);
    }

    let cropped = input.cropped_avatar.trim();
    if !cropped.is_empty() {
        if let Err(message) = check_cropped_avatar(cropped) {
            errors.insert("profile_picture", message);
        }
    } else if let Some(filename) = input.picture_filename.as_deref()
        && !filename.is_empty()
        && !has_allowed_image_extension(filename)
    {
        errors.insert("profile_picture", PICTURE_TYPE_MSG);
    }

    errors
}

pub fn validate_change_password(
    old_password: &str,
    new_password: &str,
    confirm: &str,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if old_password.is_empty() {
        errors.insert("old_password", "Please enter your current password.");
    }
    if let Some(message) = password_complexity(new_password, "New password") {
        errors.insert("new_password", message);
    }
    if new_password != confirm {
        errors.insert("confirm_password", MISMATCH_MSG);
    }
    errors
}

pub fn validate_forgot_password(email: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if !is_valid_email(&normalize_email(email)) {
        errors.insert("email", EMAIL_MSG);
    }
    errors
}

pub fn validate_reset_password(password: &str, confirm: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if let Some(message) = password_complexity(password, "Password") {
        errors.insert("password", message);
    }
    if password != confirm {
        errors.insert("confirm_password", MISMATCH_MSG);
    }
    errors
}

pub fn validate_delete_account(
    confirm_username: &str,
    password: &str,
    username: &str,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if confirm_username.trim() != username {
        errors.insert("confirm_username", "Please type your username exactly.");
    }
    if password.is_empty() {
        errors.insert("password", "Please enter your password.");
    }
    errors
}

/// Trimmed message body, or the reason it cannot be sent.
pub fn validate_message_body(raw: &str) -> Result<&str, &'static str> {
    let body = raw.trim();
    if body.is_empty() {
        return Err("Please enter a message.");
    }
    if char_len(body) > MAX_MESSAGE_CHARS {
        return Err("Message must be 500 characters or less.");
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use chrono::NaiveDate;

    use super::*;
    use crate::forms::{ProfileInput, RegisterStepInput};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).expect("valid date")
    }

    fn step_input() -> RegisterStepInput {
        RegisterStepInput::default()
    }

    #[test]
    fn username_pattern_accepts_only_word_characters() {
        for ok in ["abc", "alice01", "A_b_C", "12345678901234567890"] {
            assert!(is_valid_username(ok), "{ok} should be accepted");
        }
        for bad in ["ab", "alice-01", "alice 01", "", "123456789012345678901", "ålice"] {
            assert!(!is_valid_username(bad), "{bad} should be rejected");
        }
    }

    #[test]
    fn step_one_checks_username_and_display_name() {
        let mut input = step_input();
        input.username = "al".to_string();
        input.display_name = " A ".to_string();

        let errors = validate_register_step(1, &input, today());
        assert_eq!(errors.get("username"), USERNAME_MSG);
        assert_eq!(errors.get("display_name"), DISPLAY_NAME_MSG);

        input.username = " alice01 ".to_string();
        input.display_name = "Alice".to_string();
        assert!(validate_register_step(1, &input, today()).is_empty());
    }

    #[test]
    fn step_two_lowercases_before_matching() {
        let mut input = step_input();
        input.email = "  Alice@Example.COM ".to_string();
        assert!(validate_register_step(2, &input, today()).is_empty());

        input.email = "alice@example".to_string();
        assert_eq!(
            validate_register_step(2, &input, today()).get("email"),
            EMAIL_MSG
        );
    }

    #[test]
    fn step_three_joins_every_failed_rule() {
        let mut input = step_input();
        input.password = "abc".to_string();

        let errors = validate_register_step(3, &input, today());
        assert_eq!(
            errors.get("password"),
            "Password must be at least 8 characters. Password must include an uppercase letter. \
             Password must include a number."
        );

        input.password = "Passw0rd".to_string();
        assert!(validate_register_step(3, &input, today()).is_empty());
    }

    #[test]
    fn exactly_thirteen_today_passes_and_one_day_short_fails() {
        let mut input = step_input();
        input.age = "13".to_string();
        input.date_of_birth = "2013-03-15".to_string();
        assert!(validate_register_step(4, &input, today()).is_empty());

        input.date_of_birth = "2013-03-16".to_string();
        assert_eq!(
            validate_register_step(4, &input, today()).get("date_of_birth"),
            TOO_YOUNG_MSG
        );
    }

    #[test]
    fn step_four_reports_age_and_date_format_problems() {
        let mut input = step_input();
        input.age = "twelve".to_string();
        input.date_of_birth = "15/03/2000".to_string();
        let errors = validate_register_step(4, &input, today());
        assert_eq!(errors.get("age"), "Please enter your age in numbers.");
        assert_eq!(errors.get("date_of_birth"), BAD_DATE_MSG);

        input.age = "12".to_string();
        input.date_of_birth = String::new();
        let errors = validate_register_step(4, &input, today());
        assert_eq!(errors.get("age"), TOO_YOUNG_MSG);
        assert_eq!(errors.get("date_of_birth"), "Please enter your birthday.");
    }

    #[test]
    fn calculate_age_handles_leap_day_birthdays() {
        let dob = NaiveDate::from_ymd_opt(2012, 2, 29).expect("valid");
        let before = NaiveDate::from_ymd_opt(2025, 2, 28).expect("valid");
        let after = NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid");
        assert_eq!(calculate_age(dob, before), 12);
        assert_eq!(calculate_age(dob, after), 13);
    }

    #[test]
    fn step_five_only_rejects_disallowed_extensions() {
        let mut input = step_input();
        assert!(validate_register_step(5, &input, today()).is_empty());

        input.picture_filename = Some("me.PNG".to_string());
        assert!(validate_register_step(5, &input, today()).is_empty());

        input.picture_filename = Some("me.gif".to_string());
        assert_eq!(
            validate_register_step(5, &input, today()).get("profile_picture"),
            PICTURE_TYPE_MSG
        );
    }

    #[test]
    fn profile_update_skips_empty_optional_fields() {
        let input = ProfileInput::default();
        assert!(validate_profile_update(&input, today()).is_empty());
    }

    #[test]
    fn profile_update_flags_each_bad_field() {
        let input = ProfileInput {
            username: "no spaces".to_string(),
            location: "X".to_string(),
            phone: "71234567".to_string(),
            bio: "b".repeat(161),
            privacy: "friends".to_string(),
            gender: "other".to_string(),
            age_group: "adult".to_string(),
            date_of_birth: "2020-01-01".to_string(),
            ..ProfileInput::default()
        };

        let errors = validate_profile_update(&input, today());
        for field in [
            "username",
            "location",
            "phone",
            "bio",
            "privacy",
            "gender",
            "age_group",
            "date_of_birth",
        ] {
            assert!(errors.contains(field), "{field} should be flagged");
        }
        assert!(!errors.contains("display_name"));
    }

    #[test]
    fn cropped_avatar_must_be_supported_image_data() {
        let png = format!("data:image/png;base64,{}", STANDARD.encode([1u8, 2, 3]));
        assert_eq!(check_cropped_avatar(&png), Ok(vec![1, 2, 3]));

        assert_eq!(
            check_cropped_avatar("data:image/gif;base64,AAAA"),
            Err(CROPPED_TYPE_MSG)
        );
        assert_eq!(
            check_cropped_avatar("data:image/png;base64"),
            Err(CROPPED_INVALID_MSG)
        );
        assert_eq!(
            check_cropped_avatar("data:image/png;base64,@@@"),
            Err(CROPPED_INVALID_MSG)
        );
        assert_eq!(check_cropped_avatar("https://x/y.png"), Err(CROPPED_TYPE_MSG));
    }

    #[test]
    fn change_password_messages_use_new_password_prefix() {
        let errors = validate_change_password("", "short", "other");
        assert_eq!(errors.get("old_password"), "Please enter your current password.");
        assert!(
            errors
                .get("new_password")
                .starts_with("New password must be at least 8 characters.")
        );
        assert_eq!(errors.get("confirm_password"), MISMATCH_MSG);
    }

    #[test]
    fn delete_account_requires_exact_username() {
        let errors = validate_delete_account("Alice01", "", "alice01");
        assert_eq!(errors.len(), 2);
        assert!(validate_delete_account(" alice01 ", "pw", "alice01").is_empty());
    }

    #[test]
    fn message_body_is_trimmed_and_bounded() {
        assert_eq!(validate_message_body("  hi  "), Ok("hi"));
        assert_eq!(validate_message_body("   "), Err("Please enter a message."));
        assert!(validate_message_body(&"x".repeat(500)).is_ok());
        assert_eq!(
            validate_message_body(&"x".repeat(501)),
            Err("Message must be 500 characters or less.")
        );
    }

    #[test]
    fn login_and_forgot_password_require_input() {
        assert_eq!(validate_login(" ", "").len(), 2);
        assert!(validate_login("alice01", "pw").is_empty());
        assert!(validate_forgot_password("ALICE@example.com").is_empty());
        assert!(validate_reset_password("Passw0rd", "Passw0rd").is_empty());
        assert_eq!(
            validate_reset_password("Passw0rd", "Passw0rd!").get("confirm_password"),
            MISMATCH_MSG
        );
    }
}

use chrono::NaiveDate;
use ps_core::WarnOnce;
use ps_project::{DriveDoc, FlattenOptions, flatten_drive, validate_drive};
use serde_json::json;

fn options(start: (i32, u32, u32), days: u32) -> FlattenOptions {
    FlattenOptions {
        start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
        num_days: days,
        nominal_voltage: 3.7,
        capacity_ah: 5.0,
        dynamic_dt_s: 60.0,
    }
}

fn step(unit: &str, value: f64, duration: f64, dynamic: bool) -> serde_json::Value {
    json!({"unit": unit, "value": value.to_string(), "duration": duration,
           "repetitions": 1, "isDynamic": dynamic})
}

fn drive(value: serde_json::Value) -> DriveDoc {
    serde_json::from_value(value).unwrap()
}

#[test]
fn static_and_dynamic_steps_with_idle_padding() {
    let doc = drive(json!({
        "startingSoc": "80",
        "subCycles": [{"id": "s", "name": "commute", "steps": [
            step("A", 2.0, 3600.0, false),
            step("A", 1.0, 150.0, true),
        ]}],
        "driveCycles": [{"id": "d", "name": "daily", "segments": [{"subCycleId": "s", "repetitions": 1}]}],
        "calendarRules": [],
        "defaultDriveCycleId": "d"
    }));
    validate_drive(&doc).unwrap();

    let mut warnings = WarnOnce::new();
    let profile = flatten_drive(&doc, &options((2025, 1, 1), 2), &mut warnings).unwrap();

    let day = [3600.0, 3660.0, 3720.0, 3750.0, 86_400.0];
    let mut expected_t = vec![0.0];
    expected_t.extend(day);
    expected_t.extend(day.iter().map(|t| t + 86_400.0));
    assert_eq!(profile.time(), expected_t.as_slice());

    // each current drives the interval that starts at its sample
    let day_i = [2.0, 1.0, 1.0, 1.0, 0.0];
    let mut expected_i = day_i.to_vec();
    expected_i.extend(day_i);
    expected_i.push(0.0);
    assert_eq!(profile.current(), expected_i.as_slice());
    assert_eq!(warnings.distinct(), 0);
}

#[test]
fn weekday_rules_select_cycles() {
    let doc = drive(json!({
        "startingSoc": 50,
        "subCycles": [
            {"id": "drive", "steps": [step("A", 5.0, 100.0, false)]},
            {"id": "charge", "steps": [step("A", -1.0, 100.0, false)]}
        ],
        "driveCycles": [
            {"id": "weekday", "segments": [{"subCycleId": "drive", "repetitions": 1}]},
            {"id": "weekend", "segments": [{"subCycleId": "charge", "repetitions": 2}]}
        ],
        "calendarRules": [
            {"months": "1,2", "filterType": "weekday", "daysOrDates": "Sat,Sun", "driveCycleId": "weekend"}
        ],
        "defaultDriveCycleId": "weekday"
    }));
    validate_drive(&doc).unwrap();

    // 2025-01-03 is a Friday
    let profile = flatten_drive(&doc, &options((2025, 1, 3), 3), &mut WarnOnce::new()).unwrap();
    let i = profile.current();
    let t = profile.time();
    // Friday: drive + idle
    assert_eq!(&i[0..2], &[5.0, 0.0]);
    assert_eq!(t[2], 86_400.0);
    // Saturday and Sunday: two charge repetitions + idle
    assert_eq!(&i[2..5], &[-1.0, -1.0, 0.0]);
    assert_eq!(&i[5..8], &[-1.0, -1.0, 0.0]);
    assert_eq!(t[4], 86_400.0 + 200.0);
    assert_eq!(*t.last().unwrap(), 3.0 * 86_400.0);
    assert_eq!(*i.last().unwrap(), 0.0);
}

#[test]
fn first_matching_rule_wins_and_dates_match_day_of_month() {
    let doc = drive(json!({
        "startingSoc": 50,
        "subCycles": [
            {"id": "a", "steps": [step("A", 1.0, 10.0, false)]},
            {"id": "b", "steps": [step("A", 2.0, 10.0, false)]},
            {"id": "c", "steps": [step("A", 3.0, 10.0, false)]}
        ],
        "driveCycles": [
            {"id": "A", "segments": [{"subCycleId": "a", "repetitions": 1}]},
            {"id": "B", "segments": [{"subCycleId": "b", "repetitions": 1}]},
            {"id": "C", "segments": [{"subCycleId": "c", "repetitions": 1}]}
        ],
        "calendarRules": [
            {"months": "1", "filterType": "date", "daysOrDates": "1, x, 3", "driveCycleId": "B"},
            {"months": "1", "filterType": "weekday", "daysOrDates": "Wed,Thu", "driveCycleId": "C"}
        ],
        "defaultDriveCycleId": "A"
    }));

    // 2025-01-01 Wed (date rule first), 01-02 Thu (weekday), 01-03 Fri (date), 01-04 Sat (default)
    let profile = flatten_drive(&doc, &options((2025, 1, 1), 4), &mut WarnOnce::new()).unwrap();
    let active: Vec<f64> = profile.current().iter().copied().step_by(2).take(4).collect();
    assert_eq!(active, vec![2.0, 3.0, 2.0, 1.0]);
}

#[test]
fn units_convert_and_unsupported_steps_warn_once() {
    let doc = drive(json!({
        "startingSoc": 50,
        "subCycles": [{"id": "s", "steps": [
            step("W", 37.0, 10.0, false),
            step("C", 0.5, 10.0, false),
            step("V", 4.2, 10.0, false),
            step("kW", 1.0, 10.0, false),
            step("A", 9.0, 0.0, false),
        ]}],
        "driveCycles": [{"id": "d", "segments": [{"subCycleId": "s", "repetitions": 1}]}],
        "defaultDriveCycleId": "missing"
    }));

    let mut warnings = WarnOnce::new();
    let profile = flatten_drive(&doc, &options((2025, 3, 1), 2), &mut warnings).unwrap();
    let i = profile.current();
    assert!((i[0] - 10.0).abs() < 1e-12);
    assert_eq!(i[1], 2.5);
    assert_eq!(i[2], 0.0);
    assert_eq!(profile.time()[1..4], [10.0, 20.0, 86_400.0]);
    assert_eq!(profile.len(), 7);
    assert_eq!(warnings.distinct(), 2);
    assert_eq!(warnings.suppressed(), 2);
}

#[test]
fn overlong_day_is_not_padded() {
    let doc = drive(json!({
        "startingSoc": 50,
        "subCycles": [{"id": "s", "steps": [step("A", 1.0, 90_000.0, false)]}],
        "driveCycles": [{"id": "d", "segments": [{"subCycleId": "s", "repetitions": 1}]}]
    }));
    let profile = flatten_drive(&doc, &options((2025, 1, 1), 2), &mut WarnOnce::new()).unwrap();
    assert_eq!(profile.time(), &[0.0, 90_000.0, 180_000.0]);
    assert_eq!(profile.current(), &[1.0, 1.0, 0.0]);
}

#[test]
fn dangling_rule_reference_fails_validation() {
    let doc = drive(json!({
        "startingSoc": 50,
        "subCycles": [{"id": "s", "steps": []}],
        "driveCycles": [{"id": "d", "segments": [{"subCycleId": "s", "repetitions": 1}]}],
        "calendarRules": [
            {"months": "6", "filterType": "weekday", "daysOrDates": "Mon", "driveCycleId": "nope"}
        ]
    }));
    assert!(validate_drive(&doc).is_err());
}

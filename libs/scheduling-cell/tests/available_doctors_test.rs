mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use uuid::Uuid;

use common::{monday, time, tuesday, TestClinic};
use scheduling_cell::queries::AvailableDoctorsQuery;
use scheduling_cell::{AppointmentStatus, DayOfWeek, SchedulingError};

fn sorted(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort();
    ids
}

#[tokio::test]
async fn test_doctors_working_the_hour_without_date() {
    let clinic = TestClinic::new();
    let morning = clinic.doctor_working(DayOfWeek::MONDAY, (8, 0), (12, 0), 30).await;
    let afternoon = clinic.doctor_working(DayOfWeek::MONDAY, (13, 0), (17, 0), 30).await;
    let all_day = clinic.doctor_working(DayOfWeek::MONDAY, (8, 0), (17, 0), 30).await;
    clinic.doctor_working(DayOfWeek::TUESDAY, (8, 0), (17, 0), 30).await;
    let resolver = clinic.resolver();

    let at_ten = resolver
        .list_available_doctors(clinic.tenant_id, 1, time(10, 0), None)
        .await
        .unwrap();
    let at_two = resolver
        .list_available_doctors(clinic.tenant_id, 1, time(14, 0), None)
        .await
        .unwrap();

    assert_eq!(at_ten, sorted(vec![morning, all_day]));
    assert_eq!(at_two, sorted(vec![afternoon, all_day]));
}

#[tokio::test]
async fn test_template_end_is_exclusive() {
    let clinic = TestClinic::new();
    let doctor_id = clinic.doctor_working(DayOfWeek::MONDAY, (8, 0), (12, 0), 30).await;
    let resolver = clinic.resolver();

    let at_start = resolver
        .list_available_doctors(clinic.tenant_id, 1, time(8, 0), None)
        .await
        .unwrap();
    let at_end = resolver
        .list_available_doctors(clinic.tenant_id, 1, time(12, 0), None)
        .await
        .unwrap();

    assert_eq!(at_start, vec![doctor_id]);
    assert!(at_end.is_empty());
}

#[tokio::test]
async fn test_booked_doctor_removed_when_date_given() {
    let clinic = TestClinic::new();
    let booked = clinic.doctor_working(DayOfWeek::MONDAY, (8, 0), (12, 0), 30).await;
    let free = clinic.doctor_working(DayOfWeek::MONDAY, (8, 0), (12, 0), 30).await;
    clinic
        .reserve(booked, monday(), (10, 15), (10, 45), AppointmentStatus::Confirmed)
        .await;
    let resolver = clinic.resolver();

    let nominal = resolver
        .list_available_doctors(clinic.tenant_id, 1, time(10, 0), None)
        .await
        .unwrap();
    let on_date = resolver
        .list_available_doctors(clinic.tenant_id, 1, time(10, 0), Some(monday()))
        .await
        .unwrap();

    assert_eq!(nominal, sorted(vec![booked, free]));
    assert_eq!(on_date, vec![free]);
}

#[tokio::test]
async fn test_reservation_touching_window_does_not_remove_doctor() {
    let clinic = TestClinic::new();
    let doctor_id = clinic.doctor_working(DayOfWeek::MONDAY, (8, 0), (12, 0), 30).await;
    clinic
        .reserve(doctor_id, monday(), (9, 30), (10, 0), AppointmentStatus::Confirmed)
        .await;
    clinic
        .reserve(doctor_id, monday(), (10, 30), (11, 0), AppointmentStatus::Pending)
        .await;
    clinic
        .reserve(doctor_id, monday(), (10, 0), (10, 30), AppointmentStatus::Cancelled)
        .await;

    let available = clinic
        .resolver()
        .list_available_doctors(clinic.tenant_id, 1, time(10, 0), Some(monday()))
        .await
        .unwrap();

    assert_eq!(available, vec![doctor_id]);
}

#[tokio::test]
async fn test_tenant_slot_window_override() {
    let mut clinic = TestClinic::new();
    let doctor_id = clinic.doctor_working(DayOfWeek::MONDAY, (8, 0), (12, 0), 30).await;
    clinic
        .reserve(doctor_id, monday(), (10, 40), (11, 0), AppointmentStatus::Confirmed)
        .await;

    let default_window = clinic
        .resolver()
        .list_available_doctors(clinic.tenant_id, 1, time(10, 0), Some(monday()))
        .await
        .unwrap();

    clinic.config.tenant_slot_minutes.insert(clinic.tenant_id, 60);
    let hour_window = clinic
        .resolver()
        .list_available_doctors(clinic.tenant_id, 1, time(10, 0), Some(monday()))
        .await
        .unwrap();

    assert_eq!(default_window, vec![doctor_id]);
    assert!(hour_window.is_empty());
}

#[tokio::test]
async fn test_doctor_on_leave_is_removed() {
    let clinic = TestClinic::new();
    let on_leave = clinic.doctor_working(DayOfWeek::MONDAY, (8, 0), (12, 0), 30).await;
    let working = clinic.doctor_working(DayOfWeek::MONDAY, (8, 0), (12, 0), 30).await;
    clinic.day_off(on_leave, monday()).await;

    let available = clinic
        .resolver()
        .list_available_doctors(clinic.tenant_id, 1, time(9, 0), Some(monday()))
        .await
        .unwrap();

    assert_eq!(available, vec![working]);
}

#[tokio::test]
async fn test_other_tenants_doctors_are_excluded() {
    let clinic = TestClinic::new();
    let other = TestClinic {
        tenant_id: Uuid::new_v4(),
        store: clinic.store.clone(),
        config: clinic.config.clone(),
    };
    let ours = clinic.doctor_working(DayOfWeek::MONDAY, (8, 0), (12, 0), 30).await;
    other.doctor_working(DayOfWeek::MONDAY, (8, 0), (12, 0), 30).await;

    let available = clinic
        .resolver()
        .list_available_doctors(clinic.tenant_id, 1, time(9, 0), None)
        .await
        .unwrap();

    assert_eq!(available, vec![ours]);
}

#[tokio::test]
async fn test_date_on_other_weekday_is_rejected() {
    let clinic = TestClinic::new();
    clinic.doctor_working(DayOfWeek::MONDAY, (8, 0), (12, 0), 30).await;

    let result = clinic
        .resolver()
        .list_available_doctors(clinic.tenant_id, 1, time(9, 0), Some(tuesday()))
        .await;

    assert_matches!(result, Err(SchedulingError::Validation(_)));
}

#[tokio::test]
async fn test_doctors_query_parses_and_runs() {
    let clinic = TestClinic::new();
    let doctor_id = clinic.doctor_working(DayOfWeek::TUESDAY, (9, 0), (13, 0), 30).await;
    let resolver = clinic.resolver();

    let available = AvailableDoctorsQuery {
        tenant_id: clinic.tenant_id,
        day_of_week: 2,
        time_of_day: "09:30".to_string(),
        date: Some("2024-06-04".to_string()),
    }
    .run(&resolver)
    .await
    .unwrap();

    assert_eq!(available, vec![doctor_id]);
}

#[tokio::test]
async fn test_window_past_last_calendar_date_is_rejected() {
    let clinic = TestClinic::new();
    let last_day = DayOfWeek::of(NaiveDate::MAX);
    let doctor_id = clinic.doctor_working(last_day, (23, 0), (23, 59), 30).await;
    let resolver = clinic.resolver();

    let overflowing = AvailableDoctorsQuery {
        tenant_id: clinic.tenant_id,
        day_of_week: last_day.number(),
        time_of_day: "23:45".to_string(),
        date: Some(NaiveDate::MAX.format("%Y-%m-%d").to_string()),
    }
    .run(&resolver)
    .await;
    let fitting = resolver
        .list_available_doctors(clinic.tenant_id, last_day.number(), time(23, 0), Some(NaiveDate::MAX))
        .await
        .unwrap();

    assert_matches!(overflowing, Err(SchedulingError::Validation(_)));
    assert_eq!(fitting, vec![doctor_id]);
}

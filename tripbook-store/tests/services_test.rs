use chrono::{Local, Months, NaiveDate};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tripbook_core::password::hash_password;
use tripbook_core::repository::{UserRecord, UserRepository};
use tripbook_core::{
    CoreError, MissingReference, NewTrip, NewUser, PurchaseService, Rule, TripService, UserService,
};
use tripbook_store::{InMemoryStore, Repositories};

const EMAIL: &str = "Rosso@Hotmail.com";

struct Services {
    users: UserService,
    trips: TripService,
    purchases: PurchaseService,
}

fn services(repos: Repositories) -> Services {
    Services {
        users: UserService::new(repos.users),
        trips: TripService::new(repos.trips),
        purchases: PurchaseService::new(repos.purchases),
    }
}

fn in_memory() -> Services {
    services(Repositories::in_memory())
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        firstname: "Rosso".to_string(),
        middle_name: "Melodi".to_string(),
        surname: "Merandi".to_string(),
        address: "someAdress 99".to_string(),
        postal_code: "33rd street".to_string(),
        password: "MyPassword123".to_string(),
    }
}

fn one_year_out() -> (NaiveDate, NaiveDate) {
    let departure = Local::now().date_naive() + Months::new(12);
    (departure, departure + Months::new(1))
}

fn new_trip(origin: &str, destination: &str, cost: i32, location: &str) -> NewTrip {
    let (departure_date, return_date) = one_year_out();
    NewTrip {
        origin: origin.to_string(),
        destination: destination.to_string(),
        cost,
        location: location.to_string(),
        departure_date,
        return_date,
    }
}

#[tokio::test]
async fn test_no_users() {
    let s = in_memory();
    assert!(s.users.get_all_users(false).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_user() {
    let s = in_memory();
    assert!(s.users.create_user(new_user(EMAIL)).await.unwrap());

    let user = s.users.get_user(EMAIL, false).await.unwrap();
    assert_eq!(user.email, EMAIL);
    assert!(user.enabled);
    assert!(user.purchases().is_err());
}

#[tokio::test]
async fn test_create_twice() {
    let s = in_memory();
    assert!(s.users.create_user(new_user(EMAIL)).await.unwrap());
    assert!(!s.users.create_user(new_user(EMAIL)).await.unwrap());

    let all = s.users.get_all_users(false).await.unwrap();
    assert_eq!(all.iter().filter(|u| u.email == EMAIL).count(), 1);
}

#[tokio::test]
async fn test_email_is_case_sensitive_as_stored() {
    let s = in_memory();
    assert!(s.users.create_user(new_user(EMAIL)).await.unwrap());
    assert!(s.users.create_user(new_user("rosso@hotmail.com")).await.unwrap());

    let err = s.users.get_user("ROSSO@HOTMAIL.COM", false).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registration_stores_one_user() {
    let users = Arc::new(UserService::new(Repositories::in_memory().users));

    let mut registrations = JoinSet::new();
    for _ in 0..8 {
        let users = users.clone();
        registrations.spawn(async move { users.create_user(new_user(EMAIL)).await });
    }

    let mut created = 0;
    while let Some(joined) = registrations.join_next().await {
        if joined.unwrap().unwrap() {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(users.get_all_users(false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_control_characters_are_never_persisted() {
    let s = in_memory();
    let mut user = new_user(EMAIL);
    user.surname = "Mer\0andi".to_string();

    let err = s.users.create_user(user).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(ref v) if v.contains(Rule::UserInvalidChars)));
    assert!(s.users.get_all_users(false).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_emails_are_never_persisted() {
    let s = in_memory();

    let err = s.users.create_user(new_user("x@f.n")).await.unwrap_err();
    match err {
        CoreError::Validation(violations) => assert!(violations.contains(Rule::EmailTooShort)),
        other => panic!("expected validation error, got {:?}", other),
    }

    let long = format!("Rossi{}@Gmail.com", "a".repeat(255));
    let err = s.users.create_user(new_user(&long)).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(ref v) if v.contains(Rule::EmailTooLong)));

    assert!(s.users.get_all_users(false).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unfetched_purchases_fail_even_when_present() {
    let s = in_memory();
    s.users.create_user(new_user(EMAIL)).await.unwrap();
    let trip = s.trips.create_trip(new_trip("aaa", "BBB", 4000, "Bahamas")).await.unwrap();
    s.purchases.book_trip(EMAIL, trip).await.unwrap();

    let user = s.users.get_user(EMAIL, false).await.unwrap();
    let err = CoreError::from(user.purchases().unwrap_err());
    assert!(matches!(err, CoreError::NotLoaded(_)));
}

#[tokio::test]
async fn test_get_with_purchases() {
    let s = in_memory();
    assert!(s.users.create_user(new_user(EMAIL)).await.unwrap());
    let user = s.users.get_user(EMAIL, false).await.unwrap();

    let trip1 = s.trips.create_trip(new_trip("aaa", "BBB", 4000, "Bahamas")).await.unwrap();
    let trip2 = s.trips.create_trip(new_trip("nnn", "CCCCC", 8000, "Spain")).await.unwrap();
    let trip3 = s.trips.create_trip(new_trip("vvv", "GGG", 9000, "Thailand")).await.unwrap();

    s.purchases.book_trip(&user.email, trip1).await.unwrap();
    s.purchases.book_trip(&user.email, trip2).await.unwrap();
    s.purchases.book_trip(&user.email, trip3).await.unwrap();

    let after = s.users.get_user(EMAIL, true).await.unwrap();
    let purchases = after.purchases().unwrap();
    assert_eq!(purchases.len(), 3);
    let locations: Vec<&str> = purchases.iter().map(|p| p.trip.location.as_str()).collect();
    assert_eq!(locations, vec!["Bahamas", "Spain", "Thailand"]);
}

#[tokio::test]
async fn test_booking_order_is_not_trip_order() {
    let s = in_memory();
    s.users.create_user(new_user(EMAIL)).await.unwrap();
    let cheap = s.trips.create_trip(new_trip("aaa", "BBB", 1000, "Bahamas")).await.unwrap();
    let pricey = s.trips.create_trip(new_trip("nnn", "CCC", 9000, "Spain")).await.unwrap();

    s.purchases.book_trip(EMAIL, pricey).await.unwrap();
    s.purchases.book_trip(EMAIL, cheap).await.unwrap();

    let user = s.users.get_user(EMAIL, true).await.unwrap();
    let ids: Vec<i64> = user.purchases().unwrap().iter().map(|p| p.trip.id).collect();
    assert_eq!(ids, vec![pricey, cheap]);
}

#[tokio::test]
async fn test_trips_by_location_cheapest_first() {
    let s = in_memory();
    let expensive = s.trips.create_trip(new_trip("aaa", "BBB", 4000, "Bahamas")).await.unwrap();
    let cheap = s.trips.create_trip(new_trip("ccc", "DDD", 2000, "Bahamas")).await.unwrap();
    s.trips.create_trip(new_trip("eee", "FFF", 1000, "Spain")).await.unwrap();

    let trips = s.trips.get_by_location_order_by_cost_ascending("Bahamas").await.unwrap();
    let ids: Vec<i64> = trips.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![cheap, expensive]);

    let padded = s.trips.get_by_location_order_by_cost_ascending("  Bahamas ").await.unwrap();
    assert_eq!(padded.len(), 2);
    assert!(s.trips.get_by_location_order_by_cost_ascending("bahamas").await.unwrap().is_empty());
    assert!(s.trips.get_by_location_order_by_cost_ascending("   ").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stored_location_is_trimmed() {
    let s = in_memory();
    let id = s.trips.create_trip(new_trip(" aaa", "BBB ", 4000, " Bahamas")).await.unwrap();

    let stored = s.trips.get_trip(id).await.unwrap();
    assert_eq!(stored.location, "Bahamas");
    assert_eq!(stored.origin, "aaa");
    assert_eq!(stored.destination, "BBB");

    for query in ["Bahamas", " Bahamas"] {
        let found = s.trips.get_by_location_order_by_cost_ascending(query).await.unwrap();
        assert_eq!(found.iter().map(|t| t.id).collect::<Vec<_>>(), vec![id]);
    }
}

#[tokio::test]
async fn test_equal_cost_ties_break_by_id() {
    let s = in_memory();
    let first = s.trips.create_trip(new_trip("aaa", "BBB", 3000, "Spain")).await.unwrap();
    let second = s.trips.create_trip(new_trip("ccc", "DDD", 3000, "Spain")).await.unwrap();

    let trips = s.trips.get_by_location_order_by_cost_ascending("Spain").await.unwrap();
    assert_eq!(trips.iter().map(|t| t.id).collect::<Vec<_>>(), vec![first, second]);
}

#[tokio::test]
async fn test_top_trips_rank_by_bookings() {
    let s = in_memory();
    s.users.create_user(new_user(EMAIL)).await.unwrap();
    s.users.create_user(new_user("Bianco@Hotmail.com")).await.unwrap();

    let bahamas = s.trips.create_trip(new_trip("aaa", "BBB", 4000, "Bahamas")).await.unwrap();
    let spain = s.trips.create_trip(new_trip("nnn", "CCC", 8000, "Spain")).await.unwrap();
    let thailand = s.trips.create_trip(new_trip("vvv", "GGG", 9000, "Thailand")).await.unwrap();
    let norway = s.trips.create_trip(new_trip("ooo", "PPP", 7000, "Norway")).await.unwrap();

    s.purchases.book_trip(EMAIL, thailand).await.unwrap();
    s.purchases.book_trip("Bianco@Hotmail.com", thailand).await.unwrap();
    s.purchases.book_trip(EMAIL, spain).await.unwrap();

    let top = s.trips.get_top_n_trips(3).await.unwrap();
    let ids: Vec<i64> = top.iter().map(|t| t.id).collect();
    // Thailand twice, Spain once, then unbooked trips by id.
    assert_eq!(ids, vec![thailand, spain, bahamas]);

    let all = s.trips.get_top_n_trips(10).await.unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[3].id, norway);

    assert!(s.trips.get_top_n_trips(0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_trip_is_rejected() {
    let s = in_memory();
    let mut trip = new_trip("aaa", "BBB", -5, "Bahamas");
    trip.return_date = trip.departure_date;

    let err = s.trips.create_trip(trip).await.unwrap_err();
    match err {
        CoreError::Validation(v) => {
            assert!(v.contains(Rule::TripCostNotPositive));
            assert!(v.contains(Rule::TripDatesInverted));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(s.trips.get_top_n_trips(5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_trip() {
    let s = in_memory();
    let id = s.trips.create_trip(new_trip("aaa", "BBB", 4000, "Bahamas")).await.unwrap();
    assert_eq!(s.trips.get_trip(id).await.unwrap().destination, "BBB");
    assert!(s.trips.get_trip(id + 1).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_book_nonexistent_trip() {
    let s = in_memory();
    s.users.create_user(new_user(EMAIL)).await.unwrap();

    let err = s.purchases.book_trip(EMAIL, 42).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, CoreError::Referential(MissingReference::Trip(42))));

    let user = s.users.get_user(EMAIL, true).await.unwrap();
    assert!(user.purchases().unwrap().is_empty());
}

#[tokio::test]
async fn test_book_for_unregistered_user() {
    let s = in_memory();
    let trip = s.trips.create_trip(new_trip("aaa", "BBB", 4000, "Bahamas")).await.unwrap();

    let err = s.purchases.book_trip("nobody@nowhere.com", trip).await.unwrap_err();
    assert!(matches!(err, CoreError::Referential(MissingReference::User(ref e)) if e == "nobody@nowhere.com"));

    // Nothing was booked, so the trip has no lead over a newer one.
    let newer = s.trips.create_trip(new_trip("ccc", "DDD", 4000, "Spain")).await.unwrap();
    let top = s.trips.get_top_n_trips(2).await.unwrap();
    assert_eq!(top.iter().map(|t| t.id).collect::<Vec<_>>(), vec![trip, newer]);
}

#[tokio::test]
async fn test_delete_user_removes_purchases() {
    let s = in_memory();
    s.users.create_user(new_user(EMAIL)).await.unwrap();
    s.users.create_user(new_user("Bianco@Hotmail.com")).await.unwrap();
    let trip = s.trips.create_trip(new_trip("aaa", "BBB", 4000, "Bahamas")).await.unwrap();
    s.purchases.book_trip(EMAIL, trip).await.unwrap();
    s.purchases.book_trip(EMAIL, trip).await.unwrap();
    s.purchases.book_trip("Bianco@Hotmail.com", trip).await.unwrap();

    assert_eq!(s.users.delete_user(EMAIL).await.unwrap(), 2);
    assert!(s.users.get_user(EMAIL, false).await.unwrap_err().is_not_found());
    assert!(s.users.delete_user(EMAIL).await.unwrap_err().is_not_found());

    let other = s.users.get_user("Bianco@Hotmail.com", true).await.unwrap();
    assert_eq!(other.purchases().unwrap().len(), 1);
}

#[tokio::test]
async fn test_authenticate() {
    let s = in_memory();
    s.users.create_user(new_user(EMAIL)).await.unwrap();

    let stored = s.users.get_user(EMAIL, false).await.unwrap();
    assert_ne!(stored.password_hash.as_str(), "MyPassword123");

    assert!(s.users.authenticate(EMAIL, "MyPassword123").await.unwrap());
    assert!(!s.users.authenticate(EMAIL, "WrongPassword1").await.unwrap());
    assert!(!s.users.authenticate("nobody@nowhere.com", "MyPassword123").await.unwrap());
}

#[tokio::test]
async fn test_disabled_user_cannot_authenticate() {
    let store = Arc::new(InMemoryStore::new());
    let mut record = UserRecord::new(new_user(EMAIL), hash_password("MyPassword123").unwrap());
    record.enabled = false;
    assert!(store.insert_user(&record).await.unwrap());

    let users = UserService::new(store);
    assert!(!users.authenticate(EMAIL, "MyPassword123").await.unwrap());
}

async fn time_failed_logins(users: &UserService, email: &str) -> Duration {
    let start = Instant::now();
    for _ in 0..3 {
        assert!(!users.authenticate(email, "WrongPassword1").await.unwrap());
    }
    start.elapsed()
}

#[tokio::test]
async fn test_unknown_email_costs_a_password_check() {
    let s = in_memory();
    s.users.create_user(new_user(EMAIL)).await.unwrap();
    // First call pays for the placeholder hash itself.
    s.users.authenticate("nobody@nowhere.com", "WrongPassword1").await.unwrap();

    let known = time_failed_logins(&s.users, EMAIL).await;
    let unknown = time_failed_logins(&s.users, "nobody@nowhere.com").await;

    // Same Argon2 work on both paths; the bound only catches a skipped check.
    assert!(
        unknown * 4 >= known,
        "unknown email answered in {:?}, known email in {:?}",
        unknown,
        known
    );
}

#[tokio::test]
async fn test_all_users_eager_and_lazy() {
    let s = in_memory();
    s.users.create_user(new_user(EMAIL)).await.unwrap();
    s.users.create_user(new_user("Bianco@Hotmail.com")).await.unwrap();
    let trip = s.trips.create_trip(new_trip("aaa", "BBB", 4000, "Bahamas")).await.unwrap();
    s.purchases.book_trip("Bianco@Hotmail.com", trip).await.unwrap();

    let lazy = s.users.get_all_users(false).await.unwrap();
    assert_eq!(lazy.len(), 2);
    assert!(lazy.iter().all(|u| u.purchases().is_err()));

    let eager = s.users.get_all_users(true).await.unwrap();
    assert_eq!(eager[0].email, EMAIL);
    assert!(eager[0].purchases().unwrap().is_empty());
    assert_eq!(eager[1].purchases().unwrap().len(), 1);
}

/// Runs the booking scenario against Postgres when `TRIPBOOK_TEST_DATABASE_URL` is set.
#[tokio::test]
async fn test_postgres_booking_scenario() {
    let Ok(url) = std::env::var("TRIPBOOK_TEST_DATABASE_URL") else {
        return;
    };

    let settings = tripbook_store::app_config::DatabaseConfig::default();
    let db = tripbook_store::DbClient::new(&url, &settings).await.unwrap();
    db.migrate().await.unwrap();
    let s = services(Repositories::postgres(&db));

    let tag = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let email = format!("rosso{}@hotmail.com", tag);
    let location = format!("Bahamas-{}", tag);

    assert!(s.users.create_user(new_user(&email)).await.unwrap());
    assert!(!s.users.create_user(new_user(&email)).await.unwrap());

    let expensive = s.trips.create_trip(new_trip("aaa", "BBB", 4000, &location)).await.unwrap();
    let cheap = s.trips.create_trip(new_trip("ccc", "DDD", 2000, &location)).await.unwrap();
    let found = s.trips.get_by_location_order_by_cost_ascending(&location).await.unwrap();
    assert_eq!(found.iter().map(|t| t.id).collect::<Vec<_>>(), vec![cheap, expensive]);

    s.purchases.book_trip(&email, expensive).await.unwrap();
    s.purchases.book_trip(&email, cheap).await.unwrap();
    assert!(s.purchases.book_trip(&email, -1).await.unwrap_err().is_not_found());

    let lazy = s.users.get_user(&email, false).await.unwrap();
    assert!(lazy.purchases().is_err());
    let eager = s.users.get_user(&email, true).await.unwrap();
    let ids: Vec<i64> = eager.purchases().unwrap().iter().map(|p| p.trip.id).collect();
    assert_eq!(ids, vec![expensive, cheap]);

    assert!(s.users.authenticate(&email, "MyPassword123").await.unwrap());
    assert_eq!(s.users.delete_user(&email).await.unwrap(), 2);
}

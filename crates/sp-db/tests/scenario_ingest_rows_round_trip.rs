//! Scenario: ingest writes land in SQLite and read back typed, ordered, and
//! complete — the storage contract the report orchestrator depends on.

use chrono::{NaiveTime, TimeZone, Utc};
use sp_schemas::{BusinessHoursRow, Observation, StoreStatus, TimezoneRow};

fn obs(store: &str, min: u32, status: StoreStatus) -> Observation {
    Observation {
        store_id: store.to_string(),
        ts_utc: Utc.with_ymd_and_hms(2024, 1, 8, 12, min, 0).unwrap(),
        status,
    }
}

fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap()
}

#[tokio::test]
async fn timeline_reads_back_ascending_regardless_of_insert_order() {
    let pool = sp_db::connect_memory().await.unwrap();

    sp_db::insert_observations(
        &pool,
        &[
            obs("s1", 30, StoreStatus::Active),
            obs("s1", 10, StoreStatus::Inactive),
            obs("s1", 20, StoreStatus::Active),
            obs("s2", 5, StoreStatus::Active),
        ],
    )
    .await
    .unwrap();

    let tl = sp_db::fetch_timeline(&pool, "s1").await.unwrap();
    assert_eq!(tl.len(), 3);
    assert!(tl.windows(2).all(|w| w[0].0 <= w[1].0), "ascending order");
    assert_eq!(tl[0].1, StoreStatus::Inactive);
    assert_eq!(tl[2].1, StoreStatus::Active);

    assert!(sp_db::fetch_timeline(&pool, "nope").await.unwrap().is_empty());
}

#[tokio::test]
async fn subsecond_instants_survive_the_round_trip() {
    let pool = sp_db::connect_memory().await.unwrap();

    let ts = Utc
        .with_ymd_and_hms(2023, 1, 25, 18, 13, 22)
        .unwrap()
        .checked_add_signed(chrono::Duration::microseconds(476_590))
        .unwrap();
    sp_db::insert_observations(
        &pool,
        &[Observation {
            store_id: "s1".to_string(),
            ts_utc: ts,
            status: StoreStatus::Active,
        }],
    )
    .await
    .unwrap();

    let tl = sp_db::fetch_timeline(&pool, "s1").await.unwrap();
    assert_eq!(tl[0].0, ts);
}

#[tokio::test]
async fn business_hours_read_back_in_insertion_order() {
    let pool = sp_db::connect_memory().await.unwrap();

    sp_db::insert_business_hours(
        &pool,
        &[
            BusinessHoursRow {
                store_id: "s1".to_string(),
                day_of_week: 0,
                start_local: hms(9, 0, 0),
                end_local: hms(12, 0, 0),
            },
            BusinessHoursRow {
                store_id: "s1".to_string(),
                day_of_week: 0,
                start_local: hms(14, 0, 0),
                end_local: hms(18, 0, 0),
            },
        ],
    )
    .await
    .unwrap();

    let rows = sp_db::fetch_business_hours(&pool, "s1").await.unwrap();
    assert_eq!(
        rows,
        vec![
            (0, hms(9, 0, 0), hms(12, 0, 0)),
            (0, hms(14, 0, 0), hms(18, 0, 0)),
        ],
        "insertion order preserved so last-row-wins resolution is deterministic"
    );
}

#[tokio::test]
async fn timezone_upsert_keeps_at_most_one_row_per_store() {
    let pool = sp_db::connect_memory().await.unwrap();

    sp_db::upsert_timezones(
        &pool,
        &[TimezoneRow {
            store_id: "s1".to_string(),
            timezone_str: "America/Denver".to_string(),
        }],
    )
    .await
    .unwrap();
    sp_db::upsert_timezones(
        &pool,
        &[TimezoneRow {
            store_id: "s1".to_string(),
            timezone_str: "America/New_York".to_string(),
        }],
    )
    .await
    .unwrap();

    assert_eq!(
        sp_db::fetch_timezone(&pool, "s1").await.unwrap().as_deref(),
        Some("America/New_York")
    );
    assert_eq!(sp_db::fetch_timezone(&pool, "s2").await.unwrap(), None);
}

#[tokio::test]
async fn clear_ingest_tables_empties_all_three_sources() {
    let pool = sp_db::connect_memory().await.unwrap();

    sp_db::insert_observations(&pool, &[obs("s1", 1, StoreStatus::Active)])
        .await
        .unwrap();
    sp_db::insert_business_hours(
        &pool,
        &[BusinessHoursRow {
            store_id: "s1".to_string(),
            day_of_week: 3,
            start_local: hms(8, 0, 0),
            end_local: hms(20, 0, 0),
        }],
    )
    .await
    .unwrap();
    sp_db::upsert_timezones(
        &pool,
        &[TimezoneRow {
            store_id: "s1".to_string(),
            timezone_str: "America/Chicago".to_string(),
        }],
    )
    .await
    .unwrap();

    sp_db::clear_ingest_tables(&pool).await.unwrap();

    assert!(sp_db::list_store_ids(&pool).await.unwrap().is_empty());
    assert!(sp_db::fetch_business_hours(&pool, "s1").await.unwrap().is_empty());
    assert_eq!(sp_db::fetch_timezone(&pool, "s1").await.unwrap(), None);
}

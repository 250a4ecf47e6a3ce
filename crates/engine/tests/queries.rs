mod common;

use chrono::NaiveDate;
use engine::{
    ClockTime, CountOperator, DateRange, MaskCountFilter, MaskSort, MaskSortKey, Money,
    SalesFilter, SearchHit, SearchQuery, SearchScope, SortOrder, TopMembersFilter,
};

use common::seeded_engine;

fn t(raw: &str) -> ClockTime {
    raw.parse().unwrap()
}

fn range(start: &str, end: &str) -> DateRange {
    let parse = |raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap();
    DateRange::from_dates(parse(start), parse(end)).unwrap()
}

fn ids<T>(items: &[T], id: impl Fn(&T) -> i64) -> Vec<i64> {
    items.iter().map(id).collect()
}

#[tokio::test]
async fn open_pharmacies_follow_parsed_hours() {
    let engine = seeded_engine().await;

    let open = engine.open_pharmacies("Mon", t("09:00")).await.unwrap();
    assert_eq!(ids(&open, |p| p.id), vec![1, 2]);

    // "Thur" is not a weekday name and is kept as written; "Thursday" is.
    let open = engine.open_pharmacies("Thu", t("10:00")).await.unwrap();
    assert_eq!(ids(&open, |p| p.id), vec![3]);

    let open = engine.open_pharmacies("Sat", t("01:00")).await.unwrap();
    assert_eq!(ids(&open, |p| p.id), vec![2]);

    assert!(engine.open_pharmacies("Sun", t("12:00")).await.unwrap().is_empty());
}

#[tokio::test]
async fn pharmacies_by_mask_count_in_price_band() {
    let engine = seeded_engine().await;
    let band = |mask_count, operator| MaskCountFilter {
        min_price: Money::new(10_00),
        max_price: Money::new(35_00),
        mask_count,
        operator,
    };

    let found = engine
        .pharmacies_by_mask_count(band(2, CountOperator::Ge))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].pharmacy.name, "DFW Wellness");
    assert_eq!(found[0].mask_count, 2);
    assert_eq!(ids(&found[0].masks, |m| m.id), vec![1, 3]);

    let found = engine
        .pharmacies_by_mask_count(band(1, CountOperator::Eq))
        .await
        .unwrap();
    assert_eq!(ids(&found, |f| f.pharmacy.id), vec![2]);

    // Pharmacies without masks in the band count as zero.
    let found = engine
        .pharmacies_by_mask_count(band(1, CountOperator::Lt))
        .await
        .unwrap();
    assert_eq!(ids(&found, |f| f.pharmacy.id), vec![3]);
    assert_eq!(found[0].mask_count, 0);
    assert!(found[0].masks.is_empty());
}

#[tokio::test]
async fn pharmacy_masks_are_sorted() {
    let engine = seeded_engine().await;
    let sorted = |key, order| MaskSort { key, order };

    let masks = engine.pharmacy_masks(1, MaskSort::default()).await.unwrap();
    assert_eq!(ids(&masks, |m| m.id), vec![2, 3, 1]);

    let masks = engine
        .pharmacy_masks(1, sorted(MaskSortKey::Price, SortOrder::Asc))
        .await
        .unwrap();
    assert_eq!(ids(&masks, |m| m.id), vec![1, 3, 2]);

    let masks = engine
        .pharmacy_masks(1, sorted(MaskSortKey::Name, SortOrder::Desc))
        .await
        .unwrap();
    assert_eq!(ids(&masks, |m| m.id), vec![1, 3, 2]);

    assert!(
        engine
            .pharmacy_masks(99, MaskSort::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn search_ranks_and_merges() {
    let engine = seeded_engine().await;
    let query = |text: &str, scope, limit| SearchQuery {
        text: text.to_string(),
        scope,
        limit,
    };

    let hits = engine
        .search(&query("maskt", SearchScope::Mask, 10))
        .await
        .unwrap();
    let mut mask_ids: Vec<i64> = hits
        .iter()
        .map(|hit| match hit {
            SearchHit::Mask { id, .. } => *id,
            SearchHit::Pharmacy { .. } => panic!("pharmacy in mask search"),
        })
        .collect();
    mask_ids.sort_unstable();
    assert_eq!(mask_ids, vec![2, 5]);

    let hits = engine
        .search(&query("Carepoint", SearchScope::Both, 10))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert!(matches!(&hits[0], SearchHit::Pharmacy { name, .. } if name == "Carepoint"));

    let hits = engine
        .search(&query("green", SearchScope::Both, 2))
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits[0].relevance() >= hits[1].relevance());

    let hits = engine
        .search(&query("Carepoint", SearchScope::Mask, 10))
        .await
        .unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn mask_sales_summary_groups_by_mask_and_pharmacy() {
    let engine = seeded_engine().await;

    let summary = engine
        .mask_sales_summary(SalesFilter::default())
        .await
        .unwrap();
    assert_eq!(summary.total_amount, Money::new(13_70 + 16_75 + 3_23));
    let keys: Vec<(i64, i64)> = summary
        .details
        .iter()
        .map(|d| (d.mask_id, d.pharmacy_id))
        .collect();
    assert_eq!(keys, vec![(1, 1), (4, 2), (5, 2)]);
    assert_eq!(summary.details[0].mask_name, "True Barrier (green) (3 per pack)");

    let summary = engine
        .mask_sales_summary(SalesFilter {
            range: Some(range("2021-01-01", "2021-01-09")),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(summary.total_amount, Money::new(13_70));

    // The end date covers the whole day.
    let summary = engine
        .mask_sales_summary(SalesFilter {
            range: Some(range("2021-01-31", "2021-01-31")),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(summary.total_amount, Money::new(3_23));

    let summary = engine
        .mask_sales_summary(SalesFilter {
            pharmacy_id: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(summary.total_amount, Money::new(16_75 + 3_23));
}

#[tokio::test]
async fn top_members_ranked_by_spend() {
    let engine = seeded_engine().await;

    let ranking = engine.top_members(TopMembersFilter::default()).await.unwrap();
    assert_eq!(ids(&ranking, |r| r.member.id), vec![1, 2]);
    assert_eq!(ranking[0].total_spent, Money::new(13_70 + 16_75));
    assert!(ranking[0].transactions.is_none());

    let ranking = engine
        .top_members(TopMembersFilter {
            limit: 1,
            with_transactions: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(ranking.len(), 1);
    let transactions = ranking[0].transactions.as_ref().unwrap();
    assert_eq!(ids(transactions, |h| h.mask_id), vec![4, 1]);

    let ranking = engine
        .top_members(TopMembersFilter {
            range: Some(range("2021-01-31", "2021-01-31")),
            with_transactions: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(&ranking, |r| r.member.id), vec![2]);
    assert_eq!(ranking[0].transactions.as_ref().unwrap().len(), 1);
}

// tests/filter_properties.rs
//
// Property-style checks over seeded random datasets and criteria.

use campaign_insights::filter::apply;
use campaign_insights::ingest::ingest_csv;
use campaign_insights::{Dataset, FilterCriteria, RowId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const NAMES: [&str; 6] = ["Promo Blast", "Weekly News", "", "promo retarget", "Winback", "PROMO"];

fn random_dataset(rng: &mut StdRng, rows: usize) -> Dataset {
    let mut csv = String::from("Email Name,Open Rate,Click Rate\n");
    for _ in 0..rows {
        let name = NAMES[rng.random_range(0..NAMES.len())];
        let open: f64 = rng.random_range(0.0..60.0);
        // sometimes garbage, which normalizes to 0
        let click = if rng.random_bool(0.1) {
            "n/a".to_string()
        } else {
            format!("{:.1}", rng.random_range(0.0..10.0))
        };
        csv.push_str(&format!("{name},{open:.2},{click}\n"));
    }
    ingest_csv(csv.as_bytes()).unwrap()
}

fn random_bound(rng: &mut StdRng, hi: f64) -> Option<f64> {
    rng.random_bool(0.5).then(|| rng.random_range(0.0..hi))
}

fn random_criteria(rng: &mut StdRng) -> FilterCriteria {
    let name_query = match rng.random_range(0..4) {
        0 => Some("promo".to_string()),
        1 => Some("NEWS".to_string()),
        _ => None,
    };
    FilterCriteria {
        name_query,
        min_open_rate: random_bound(rng, 60.0),
        max_open_rate: random_bound(rng, 60.0),
        min_click_rate: random_bound(rng, 10.0),
        max_click_rate: random_bound(rng, 10.0),
    }
}

/// Each constraint alone, as its own criteria.
fn split(c: &FilterCriteria) -> Vec<FilterCriteria> {
    let base = FilterCriteria::default();
    vec![
        FilterCriteria { name_query: c.name_query.clone(), ..base.clone() },
        FilterCriteria { min_open_rate: c.min_open_rate, ..base.clone() },
        FilterCriteria { max_open_rate: c.max_open_rate, ..base.clone() },
        FilterCriteria { min_click_rate: c.min_click_rate, ..base.clone() },
        FilterCriteria { max_click_rate: c.max_click_rate, ..base },
    ]
}

fn is_subsequence(view: &[RowId], all: usize) -> bool {
    view.windows(2).all(|w| w[0] < w[1]) && view.iter().all(|id| *id < all)
}

#[test]
fn view_is_ordered_subsequence_and_idempotent() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let ds = random_dataset(&mut rng, 40);
        let c = random_criteria(&mut rng);
        let v1 = apply(&ds, &c);
        let v2 = apply(&ds, &c);
        assert_eq!(v1, v2);
        assert!(is_subsequence(v1.rows(), ds.len()));
    }
}

#[test]
fn conjunction_does_not_depend_on_constraint_order() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let ds = random_dataset(&mut rng, 30);
        let c = random_criteria(&mut rng);
        let combined = apply(&ds, &c);

        let singles: Vec<_> = split(&c).iter().map(|s| apply(&ds, s)).collect();
        // intersect single-constraint views in reverse order
        let mut acc: Vec<RowId> = (0..ds.len()).collect();
        for v in singles.iter().rev() {
            acc.retain(|id| v.contains(*id));
        }
        assert_eq!(combined.rows(), acc.as_slice(), "criteria: {c:?}");
    }
}

#[test]
fn min_open_rate_above_all_rows_is_empty() {
    let ds = ingest_csv(b"Email Name,Sent,Open Rate\nPromo,100,25.5\n").unwrap();
    let c = FilterCriteria {
        min_open_rate: Some(30.0),
        ..Default::default()
    };
    assert!(apply(&ds, &c).is_empty());
}

#[test]
fn lowercase_term_matches_mixed_case_name() {
    let ds = ingest_csv(b"Email Name\nPromo Blast\nNewsletter\n").unwrap();
    let c = FilterCriteria {
        name_query: Some("promo".into()),
        ..Default::default()
    };
    assert_eq!(apply(&ds, &c).rows(), &[0]);
}

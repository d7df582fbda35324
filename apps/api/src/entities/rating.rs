//! Vote-derived rating shown next to every entity.

/// Rating reported when an entity has no votes at all.
pub const NEUTRAL_RATING: f64 = 2.5;
pub const MIN_RATING: f64 = 0.5;
pub const MAX_RATING: f64 = 5.0;

/// Maps the upvote share onto [0.5, 5.0]:
/// `clamp(0.5, 5.0, round(u / (u + d) * 4.5 + 0.5))`, 2.5 when there are no votes.
/// Rounded to hundredths so that an even split reads 2.75.
pub fn compute_rating(upvotes: i64, downvotes: i64) -> f64 {
    let up = upvotes.max(0) as f64;
    let down = downvotes.max(0) as f64;
    let total = up + down;
    if total == 0.0 {
        return NEUTRAL_RATING;
    }
    let raw = (up / total) * 4.5 + MIN_RATING;
    round_hundredths(raw).clamp(MIN_RATING, MAX_RATING)
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// SQL expression computing the same rating for an aliased entity table `e`.
pub const RATING_SQL: &str = "CASE WHEN e.upvotes + e.downvotes = 0 THEN 2.5 \
     ELSE LEAST(5.0, GREATEST(0.5, ROUND((e.upvotes::numeric / (e.upvotes + e.downvotes)) * 4.5 + 0.5, 2))) END";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_votes_is_neutral() {
        assert_eq!(compute_rating(0, 0), 2.5);
    }

    #[test]
    fn test_documented_examples() {
        assert_eq!(compute_rating(10, 0), 5.0);
        assert_eq!(compute_rating(0, 10), 0.5);
        assert_eq!(compute_rating(5, 5), 2.75);
    }

    #[test]
    fn test_negative_counters_treated_as_zero() {
        assert_eq!(compute_rating(-3, 0), 2.5);
        assert_eq!(compute_rating(4, -1), 5.0);
    }

    #[test]
    fn test_rating_bounds_and_formula_over_grid() {
        for up in 0..=60_i64 {
            for down in 0..=60_i64 {
                let rating = compute_rating(up, down);
                assert!((MIN_RATING..=MAX_RATING).contains(&rating), "({up},{down}) -> {rating}");
                if up + down == 0 {
                    continue;
                }
                let expected = (up as f64 / (up + down) as f64) * 4.5 + 0.5;
                assert!(
                    (rating - expected).abs() <= 0.005 + 1e-9,
                    "({up},{down}) -> {rating}, expected ~{expected}"
                );
            }
        }
    }

    #[test]
    fn test_more_upvotes_never_lowers_rating() {
        for down in 0..=30_i64 {
            let mut previous = compute_rating(0, down);
            for up in 1..=30_i64 {
                let rating = compute_rating(up, down);
                assert!(rating >= previous, "({up},{down}) dropped to {rating}");
                previous = rating;
            }
        }
    }

    #[test]
    fn test_sql_expression_mirrors_constants() {
        assert!(RATING_SQL.contains("4.5"));
        assert!(RATING_SQL.contains("THEN 2.5"));
    }
}

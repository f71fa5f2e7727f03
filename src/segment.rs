//! Customer segmentation by number of orders placed

use crate::data::i64_values;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fmt;

/// Ordinal customer bucket, from the lightest to the heaviest buyers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CustomerCategory {
    Light,
    Medium,
    Heavy,
    Addicted,
}

impl CustomerCategory {
    pub const ALL: [CustomerCategory; 4] = [
        CustomerCategory::Light,
        CustomerCategory::Medium,
        CustomerCategory::Heavy,
        CustomerCategory::Addicted,
    ];

    /// Bucket a customer by total order count
    ///
    /// Boundaries are half-open: `[0, 10)` Light, `[10, 20)` Medium,
    /// `[20, 50)` Heavy, `[50, ∞)` Addicted. Negative counts have no bucket.
    pub fn classify(total_items: i64) -> Option<Self> {
        match total_items {
            i64::MIN..=-1 => None,
            0..=9 => Some(CustomerCategory::Light),
            10..=19 => Some(CustomerCategory::Medium),
            20..=49 => Some(CustomerCategory::Heavy),
            _ => Some(CustomerCategory::Addicted),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerCategory::Light => "Light",
            CustomerCategory::Medium => "Medium",
            CustomerCategory::Heavy => "Heavy",
            CustomerCategory::Addicted => "Addicted",
        }
    }
}

impl fmt::Display for CustomerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A customer's order count and bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomerSegment {
    pub user_id: i64,
    pub total_items: i64,
    pub category: CustomerCategory,
}

/// Count each user's orders and bucket them, sorted by `user_id`
pub fn customer_segments(orders: &DataFrame) -> crate::Result<Vec<CustomerSegment>> {
    let df = orders
        .clone()
        .lazy()
        .group_by([col("user_id")])
        .agg([col("order_number")
            .count()
            .cast(DataType::Int64)
            .alias("total_items")])
        .sort(["user_id"], SortMultipleOptions::default())
        .collect()?;

    let users = i64_values(&df, "user_id")?;
    let totals = i64_values(&df, "total_items")?;

    users
        .into_iter()
        .zip(totals)
        .map(|(user_id, total_items)| {
            let category = CustomerCategory::classify(total_items).ok_or_else(|| {
                anyhow::anyhow!("user {user_id} has a negative order count: {total_items}")
            })?;
            Ok(CustomerSegment {
                user_id,
                total_items,
                category,
            })
        })
        .collect()
}

/// Number of users per bucket; every bucket is present, even when empty
pub fn segment_counts(segments: &[CustomerSegment]) -> BTreeMap<CustomerCategory, usize> {
    let mut counts: BTreeMap<CustomerCategory, usize> =
        CustomerCategory::ALL.iter().map(|c| (*c, 0)).collect();
    for segment in segments {
        *counts.entry(segment.category).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(CustomerCategory::classify(0), Some(CustomerCategory::Light));
        assert_eq!(CustomerCategory::classify(9), Some(CustomerCategory::Light));
        assert_eq!(CustomerCategory::classify(10), Some(CustomerCategory::Medium));
        assert_eq!(CustomerCategory::classify(19), Some(CustomerCategory::Medium));
        assert_eq!(CustomerCategory::classify(20), Some(CustomerCategory::Heavy));
        assert_eq!(CustomerCategory::classify(49), Some(CustomerCategory::Heavy));
        assert_eq!(CustomerCategory::classify(50), Some(CustomerCategory::Addicted));
        assert_eq!(CustomerCategory::classify(10_000), Some(CustomerCategory::Addicted));
        assert_eq!(CustomerCategory::classify(-1), None);
    }

    #[test]
    fn test_classify_is_monotonic() {
        let mut previous = CustomerCategory::Light;
        for total in 0..200 {
            let category = CustomerCategory::classify(total).unwrap();
            assert!(category >= previous);
            previous = category;
        }
    }

    #[test]
    fn test_customer_segments() {
        let user_ids: Vec<i64> = std::iter::repeat(7)
            .take(12)
            .chain(std::iter::repeat(3).take(2))
            .collect();
        let order_numbers: Vec<i64> = (1..=12).chain(1..=2).collect();
        let orders = df!(
            "user_id" => user_ids,
            "order_number" => order_numbers,
        )
        .unwrap();

        let segments = customer_segments(&orders).unwrap();
        assert_eq!(
            segments,
            vec![
                CustomerSegment {
                    user_id: 3,
                    total_items: 2,
                    category: CustomerCategory::Light,
                },
                CustomerSegment {
                    user_id: 7,
                    total_items: 12,
                    category: CustomerCategory::Medium,
                },
            ]
        );
    }

    #[test]
    fn test_segment_counts_cover_every_bucket() {
        let segments = [
            CustomerSegment {
                user_id: 1,
                total_items: 3,
                category: CustomerCategory::Light,
            },
            CustomerSegment {
                user_id: 2,
                total_items: 60,
                category: CustomerCategory::Addicted,
            },
            CustomerSegment {
                user_id: 3,
                total_items: 1,
                category: CustomerCategory::Light,
            },
        ];

        let counts = segment_counts(&segments);
        assert_eq!(counts.len(), 4);
        assert_eq!(counts[&CustomerCategory::Light], 2);
        assert_eq!(counts[&CustomerCategory::Medium], 0);
        assert_eq!(counts[&CustomerCategory::Heavy], 0);
        assert_eq!(counts[&CustomerCategory::Addicted], 1);
        assert_eq!(counts.values().sum::<usize>(), segments.len());
    }
}

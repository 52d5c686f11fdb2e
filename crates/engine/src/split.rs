//! Split allocator: turns an expense total and a split rule into the owed
//! [`Share`]s of the participants.
//!
//! Two rules are supported:
//!
//! - [`Split::Equal`]: every participant owes `round(total / n)`; the last
//!   participant absorbs the rounding remainder so the shares sum exactly to
//!   the total.
//! - [`Split::Unequal`]: the caller gives each participant's amount; they are
//!   taken verbatim once they sum to the total within one minor unit.
//!
//! ```rust
//! use engine::{MoneyCents, Split, allocate};
//!
//! let split = Split::equal(["alice", "bob", "carol"]);
//! let shares = allocate(MoneyCents::new(100_00), &split).unwrap();
//! let owed: Vec<i64> = shares.iter().map(|s| s.owed.cents()).collect();
//! assert_eq!(owed, vec![33_33, 33_33, 33_34]);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{MoneyCents, Share, ValidationError};

/// Largest accepted gap between the unequal amounts and the total.
pub const SUM_TOLERANCE: MoneyCents = MoneyCents::new(1);

/// Largest expense total (one billion major units). Keeps room-wide sums of
/// balances and spending far away from `i64` overflow.
pub const MAX_AMOUNT: MoneyCents = MoneyCents::new(1_000_000_000_00);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    #[default]
    Equal,
    Unequal,
}

/// How an expense total is divided between participants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Split {
    Equal { participants: Vec<String> },
    Unequal { amounts: Vec<(String, MoneyCents)> },
}

impl Split {
    pub fn equal<I, S>(participants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Equal {
            participants: participants.into_iter().map(Into::into).collect(),
        }
    }

    pub fn unequal<I, S>(amounts: I) -> Self
    where
        I: IntoIterator<Item = (S, MoneyCents)>,
        S: Into<String>,
    {
        Self::Unequal {
            amounts: amounts.into_iter().map(|(m, a)| (m.into(), a)).collect(),
        }
    }

    pub fn mode(&self) -> SplitMode {
        match self {
            Self::Equal { .. } => SplitMode::Equal,
            Self::Unequal { .. } => SplitMode::Unequal,
        }
    }

    /// Members that will owe a share, in split order.
    pub fn participants(&self) -> Vec<&str> {
        match self {
            Self::Equal { participants } => participants.iter().map(String::as_str).collect(),
            Self::Unequal { amounts } => amounts.iter().map(|(m, _)| m.as_str()).collect(),
        }
    }
}

/// Allocates `total` between the participants of `split`.
///
/// All returned shares are unsettled and keep the participants' order.
pub fn allocate(total: MoneyCents, split: &Split) -> Result<Vec<Share>, ValidationError> {
    if !total.is_positive() {
        return Err(ValidationError::NonPositiveAmount);
    }
    if total > MAX_AMOUNT {
        return Err(ValidationError::AmountTooLarge {
            amount: total,
            max: MAX_AMOUNT,
        });
    }
    ensure_unique(split.participants())?;

    match split {
        Split::Equal { participants } => allocate_equal(total, participants),
        Split::Unequal { amounts } => allocate_unequal(total, amounts),
    }
}

fn ensure_unique(participants: Vec<&str>) -> Result<(), ValidationError> {
    if participants.is_empty() {
        return Err(ValidationError::EmptyParticipants);
    }
    let mut seen = HashSet::with_capacity(participants.len());
    for member in participants {
        if member.trim().is_empty() {
            return Err(ValidationError::field("participant", "member id must not be empty"));
        }
        if !seen.insert(member) {
            return Err(ValidationError::DuplicateParticipant(member.to_string()));
        }
    }
    Ok(())
}

fn allocate_equal(total: MoneyCents, participants: &[String]) -> Result<Vec<Share>, ValidationError> {
    let count = participants.len();
    let too_small = || ValidationError::AmountTooSmall {
        amount: total,
        participants: count,
    };

    let n = i64::try_from(count).map_err(|_| too_small())?;
    let per = total.div_round(n).ok_or(ValidationError::EmptyParticipants)?;
    let last = per
        .checked_mul(n - 1)
        .and_then(|head| total.checked_sub(head))
        .ok_or_else(too_small)?;

    // With fewer cents than participants the rounding would hand out zero or
    // negative shares.
    if !per.is_positive() || !last.is_positive() {
        return Err(too_small());
    }

    Ok(participants
        .iter()
        .enumerate()
        .map(|(idx, member)| {
            let owed = if idx + 1 == count { last } else { per };
            Share::new(member.clone(), owed)
        })
        .collect())
}

fn allocate_unequal(
    total: MoneyCents,
    amounts: &[(String, MoneyCents)],
) -> Result<Vec<Share>, ValidationError> {
    if amounts.iter().any(|(_, amount)| !amount.is_positive()) {
        return Err(ValidationError::NonPositiveAmount);
    }

    let sum = amounts
        .iter()
        .try_fold(MoneyCents::ZERO, |acc, (_, amount)| acc.checked_add(*amount))
        .ok_or_else(|| ValidationError::field("amount", "shares overflow"))?;
    if (sum - total).abs() > SUM_TOLERANCE {
        return Err(ValidationError::SumMismatch {
            expected: total,
            actual: sum,
        });
    }

    Ok(amounts
        .iter()
        .map(|(member, amount)| Share::new(member.clone(), *amount))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(shares: &[Share]) -> Vec<i64> {
        shares.iter().map(|s| s.owed.cents()).collect()
    }

    #[test]
    fn equal_split_divides_evenly() {
        let shares = allocate(MoneyCents::new(90_00), &Split::equal(["a", "b", "c"])).unwrap();
        assert_eq!(cents(&shares), vec![30_00, 30_00, 30_00]);
        assert!(shares.iter().all(|s| !s.settled));
        let members: Vec<&str> = shares.iter().map(|s| s.member_id.as_str()).collect();
        assert_eq!(members, vec!["a", "b", "c"]);
    }

    #[test]
    fn equal_split_puts_remainder_on_last() {
        let shares = allocate(MoneyCents::new(100_00), &Split::equal(["a", "b", "c"])).unwrap();
        assert_eq!(cents(&shares), vec![33_33, 33_33, 33_34]);
        assert_eq!(shares.iter().map(|s| s.owed).sum::<MoneyCents>(), MoneyCents::new(100_00));
    }

    #[test]
    fn equal_split_last_share_can_be_lower() {
        // 200.00 / 3 rounds up to 66.67, so the last share is one cent lower.
        let shares = allocate(MoneyCents::new(200_00), &Split::equal(["a", "b", "c"])).unwrap();
        assert_eq!(cents(&shares), vec![66_67, 66_67, 66_66]);
    }

    #[test]
    fn equal_split_sums_exactly_for_many_totals() {
        let totals = (1..=40).chain([1_00, 1_01, 7_77, 10_00, 99_99, 123_45, 1_000_01]);
        for total in totals {
            for n in 1..=12i64 {
                let members: Vec<String> = (0..n).map(|i| format!("m{i}")).collect();
                // Half-up rounding of total / n, then the remainder on the last share.
                let per = (2 * total + n) / (2 * n);
                let last = total - per * (n - 1);
                let result = allocate(MoneyCents::new(total), &Split::equal(members));

                if per > 0 && last > 0 {
                    let shares = result.unwrap();
                    assert_eq!(shares.len() as i64, n);
                    assert_eq!(
                        shares.iter().map(|s| s.owed).sum::<MoneyCents>(),
                        MoneyCents::new(total),
                        "{total} / {n}"
                    );
                    assert!(shares.iter().all(|s| s.owed.is_positive()));
                } else {
                    // Rounding up can only eat the last share while total < n * n.
                    assert!(total < n * n, "{total} / {n} rejected");
                    assert!(
                        matches!(result, Err(ValidationError::AmountTooSmall { .. })),
                        "{total} / {n}"
                    );
                }
            }
        }
        assert!(allocate(MoneyCents::new(3), &Split::equal(["a", "b", "c"])).is_ok());
    }

    #[test]
    fn equal_split_rejects_rounding_to_a_non_positive_last_share() {
        // 2 cents / 3 rounds to 1 each, leaving 0 for the last member.
        assert!(matches!(
            allocate(MoneyCents::new(2), &Split::equal(["a", "b", "c"])),
            Err(ValidationError::AmountTooSmall { participants: 3, .. })
        ));
        // 15 cents / 10 rounds up to 2 each, which would leave -3.
        let ten: Vec<String> = (0..10).map(|i| format!("m{i}")).collect();
        assert!(matches!(
            allocate(MoneyCents::new(15), &Split::equal(ten)),
            Err(ValidationError::AmountTooSmall { participants: 10, .. })
        ));
    }

    #[test]
    fn rejects_total_above_maximum() {
        assert!(allocate(MAX_AMOUNT, &Split::equal(["a", "b"])).is_ok());

        let too_big = MAX_AMOUNT + MoneyCents::new(1);
        assert_eq!(
            allocate(too_big, &Split::equal(["a", "b"])).unwrap_err(),
            ValidationError::AmountTooLarge {
                amount: too_big,
                max: MAX_AMOUNT,
            }
        );
        let half = MoneyCents::new(i64::MAX / 2 + 1);
        assert!(matches!(
            allocate(half, &Split::unequal([("b", half)])),
            Err(ValidationError::AmountTooLarge { .. })
        ));
    }

    #[test]
    fn equal_split_rejects_amount_smaller_than_participants() {
        let err = allocate(MoneyCents::new(5), &Split::equal(["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]))
            .unwrap_err();
        assert!(matches!(err, ValidationError::AmountTooSmall { participants: 10, .. }));
    }

    #[test]
    fn equal_split_requires_participants() {
        let err = allocate(MoneyCents::new(10_00), &Split::equal(Vec::<String>::new())).unwrap_err();
        assert_eq!(err, ValidationError::EmptyParticipants);
    }

    #[test]
    fn rejects_non_positive_total() {
        assert_eq!(
            allocate(MoneyCents::ZERO, &Split::equal(["a"])).unwrap_err(),
            ValidationError::NonPositiveAmount
        );
        assert_eq!(
            allocate(MoneyCents::new(-1_00), &Split::equal(["a"])).unwrap_err(),
            ValidationError::NonPositiveAmount
        );
    }

    #[test]
    fn rejects_duplicate_participants() {
        let err = allocate(MoneyCents::new(10_00), &Split::equal(["a", "b", "a"])).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateParticipant("a".to_string()));
    }

    #[test]
    fn unequal_split_accepts_matching_sum() {
        let split = Split::unequal([
            ("a", MoneyCents::new(40_00)),
            ("b", MoneyCents::new(35_00)),
            ("c", MoneyCents::new(25_00)),
        ]);
        let shares = allocate(MoneyCents::new(100_00), &split).unwrap();
        assert_eq!(cents(&shares), vec![40_00, 35_00, 25_00]);
    }

    #[test]
    fn unequal_split_rejects_sum_mismatch() {
        let split = Split::unequal([
            ("a", MoneyCents::new(40_00)),
            ("b", MoneyCents::new(35_00)),
            ("c", MoneyCents::new(24_00)),
        ]);
        let err = allocate(MoneyCents::new(100_00), &split).unwrap_err();
        assert_eq!(
            err,
            ValidationError::SumMismatch {
                expected: MoneyCents::new(100_00),
                actual: MoneyCents::new(99_00),
            }
        );
    }

    #[test]
    fn unequal_split_tolerates_one_cent() {
        let split = Split::unequal([("a", MoneyCents::new(50_00)), ("b", MoneyCents::new(49_99))]);
        assert!(allocate(MoneyCents::new(100_00), &split).is_ok());

        let split = Split::unequal([("a", MoneyCents::new(50_00)), ("b", MoneyCents::new(49_98))]);
        assert!(matches!(
            allocate(MoneyCents::new(100_00), &split),
            Err(ValidationError::SumMismatch { .. })
        ));
    }

    #[test]
    fn unequal_split_rejects_non_positive_amounts() {
        let split = Split::unequal([("a", MoneyCents::new(100_00)), ("b", MoneyCents::ZERO)]);
        assert_eq!(
            allocate(MoneyCents::new(100_00), &split).unwrap_err(),
            ValidationError::NonPositiveAmount
        );
    }

    #[test]
    fn unequal_split_requires_entries() {
        let split = Split::unequal(Vec::<(String, MoneyCents)>::new());
        assert_eq!(
            allocate(MoneyCents::new(1_00), &split).unwrap_err(),
            ValidationError::EmptyParticipants
        );
    }
}

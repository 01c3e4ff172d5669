//! Split allocation - turns one expense amount into per-member owed shares.
//!
//! All arithmetic happens on whole minor units. Whatever cannot be divided evenly
//! is handed out one minor unit at a time to participants in ascending member id
//! order, so the shares always add up to exactly the expense amount.

use super::{model::MemberId, money::Money};
use crate::errors::{Error, Result};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use std::collections::BTreeMap;

/// Splits `amount` between `participants`.
///
/// Without `weights` every participant owes an equal share. With `weights`, given in
/// the same order as `participants`, each share is proportional to its weight and
/// floored to a whole minor unit before the leftover units are distributed.
///
/// # Errors
/// - [`Error::InvalidAmount`] if `amount` is zero or negative
/// - [`Error::EmptyParticipants`] if there is nobody to split between
/// - [`Error::DuplicateParticipant`] if a member is listed twice
/// - [`Error::InvalidWeights`] if a weight is not positive or the counts differ
pub fn allocate(
    amount: Money,
    participants: &[MemberId],
    weights: Option<&[Decimal]>,
) -> Result<BTreeMap<MemberId, Money>> {
    if !amount.is_positive() {
        return Err(Error::InvalidAmount {
            amount: Decimal::from(amount.minor()),
        });
    }

    if participants.is_empty() {
        return Err(Error::EmptyParticipants);
    }

    let mut shares = BTreeMap::new();
    match weights {
        None => {
            let count = i64::try_from(participants.len())?;
            let base = Money::from_minor(amount.minor() / count);
            for &member in participants {
                if shares.insert(member, base).is_some() {
                    return Err(Error::DuplicateParticipant { member });
                }
            }
        }
        Some(weights) => {
            validate_weights(participants, weights)?;
            let total_weight = weights
                .iter()
                .try_fold(Decimal::ZERO, |sum, weight| sum.checked_add(*weight))
                .ok_or(Error::InvalidWeights {
                    message: "weights are too large to add up".to_string(),
                })?;
            let total = Decimal::from(amount.minor());

            for (&member, &weight) in participants.iter().zip(weights) {
                let share = total
                    .checked_mul(weight)
                    .and_then(|scaled| scaled.checked_div(total_weight))
                    .and_then(|exact| exact.floor().to_i64())
                    .ok_or(Error::InvalidWeights {
                        message: format!("share for member {member} does not fit in minor units"),
                    })?;
                if shares.insert(member, Money::from_minor(share)).is_some() {
                    return Err(Error::DuplicateParticipant { member });
                }
            }
        }
    }

    distribute_remainder(amount, &mut shares)?;
    Ok(shares)
}

fn validate_weights(participants: &[MemberId], weights: &[Decimal]) -> Result<()> {
    if weights.len() != participants.len() {
        return Err(Error::InvalidWeights {
            message: format!(
                "expected {} weights, got {}",
                participants.len(),
                weights.len()
            ),
        });
    }

    if let Some(weight) = weights.iter().find(|weight| **weight <= Decimal::ZERO) {
        return Err(Error::InvalidWeights {
            message: format!("weight {weight} is not positive"),
        });
    }

    Ok(())
}

/// Hands the minor units lost to flooring back out, one each, lowest member id first.
///
/// Flooring loses less than one unit per participant. Weights so far apart that
/// decimal precision runs out can break that, and are rejected.
fn distribute_remainder(amount: Money, shares: &mut BTreeMap<MemberId, Money>) -> Result<()> {
    let remainder = Money::checked_sum(shares.values().copied())
        .and_then(|allocated| amount.checked_sub(allocated))
        .map(Money::minor)
        .ok_or(Error::AmountOverflow {
            operation: "adding up allocated shares",
        })?;

    let count = i64::try_from(shares.len())?;
    if !(0..count).contains(&remainder) {
        return Err(Error::InvalidWeights {
            message: format!("weights do not split {amount} minor units exactly"),
        });
    }

    for share in shares.values_mut().take(usize::try_from(remainder)?) {
        *share += Money::from_minor(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::str::FromStr;

    fn members(ids: &[i64]) -> Vec<MemberId> {
        ids.iter().copied().map(MemberId).collect()
    }

    fn minor(shares: &BTreeMap<MemberId, Money>) -> Vec<(i64, i64)> {
        shares.iter().map(|(m, s)| (m.0, s.minor())).collect()
    }

    #[test]
    fn test_equal_split_exact() {
        let shares = allocate(Money::from_minor(1200), &members(&[1, 2, 3, 4]), None).unwrap();
        assert_eq!(minor(&shares), vec![(1, 300), (2, 300), (3, 300), (4, 300)]);
    }

    #[test]
    fn test_equal_split_remainder_goes_to_lowest_ids() {
        let shares = allocate(Money::from_minor(100), &members(&[1, 2, 3]), None).unwrap();
        assert_eq!(minor(&shares), vec![(1, 34), (2, 33), (3, 33)]);
    }

    #[test]
    fn test_remainder_order_ignores_input_order() {
        let shares = allocate(Money::from_minor(101), &members(&[9, 4, 7]), None).unwrap();
        assert_eq!(minor(&shares), vec![(4, 34), (7, 34), (9, 33)]);
    }

    #[test]
    fn test_single_participant_gets_everything() {
        let shares = allocate(Money::from_minor(999), &members(&[5]), None).unwrap();
        assert_eq!(minor(&shares), vec![(5, 999)]);
    }

    #[test]
    fn test_amount_smaller_than_participant_count() {
        let shares = allocate(Money::from_minor(2), &members(&[1, 2, 3]), None).unwrap();
        assert_eq!(minor(&shares), vec![(1, 1), (2, 1), (3, 0)]);
    }

    #[test]
    fn test_weighted_split() {
        let weights = [Decimal::from(2), Decimal::from(1), Decimal::from(1)];
        let shares =
            allocate(Money::from_minor(1000), &members(&[1, 2, 3]), Some(&weights)).unwrap();
        assert_eq!(minor(&shares), vec![(1, 500), (2, 250), (3, 250)]);
    }

    #[test]
    fn test_weighted_split_with_remainder() {
        // 100 * 1/3 = 33.33.., floors to 33 each, one unit left for member 1
        let weights = [Decimal::ONE, Decimal::ONE, Decimal::ONE];
        let shares =
            allocate(Money::from_minor(100), &members(&[1, 2, 3]), Some(&weights)).unwrap();
        assert_eq!(minor(&shares), vec![(1, 34), (2, 33), (3, 33)]);
    }

    #[test]
    fn test_fractional_weights() {
        let weights = [
            Decimal::from_str("0.5").unwrap(),
            Decimal::from_str("1.5").unwrap(),
        ];
        let shares = allocate(Money::from_minor(401), &members(&[1, 2]), Some(&weights)).unwrap();
        // 100.25 -> 100, 300.75 -> 300, one leftover unit to member 1
        assert_eq!(minor(&shares), vec![(1, 101), (2, 300)]);
    }

    #[test]
    fn test_invalid_amount() {
        let result = allocate(Money::ZERO, &members(&[1]), None);
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));

        let result = allocate(Money::from_minor(-5), &members(&[1]), None);
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
    }

    #[test]
    fn test_empty_participants() {
        let result = allocate(Money::from_minor(100), &[], None);
        assert!(matches!(result, Err(Error::EmptyParticipants)));
    }

    #[test]
    fn test_duplicate_participant() {
        let result = allocate(Money::from_minor(100), &members(&[1, 2, 1]), None);
        assert!(matches!(
            result,
            Err(Error::DuplicateParticipant { member: MemberId(1) })
        ));
    }

    #[test]
    fn test_invalid_weights() {
        let participants = members(&[1, 2]);

        let result = allocate(Money::from_minor(100), &participants, Some(&[Decimal::ONE]));
        assert!(matches!(result, Err(Error::InvalidWeights { .. })));

        let result = allocate(
            Money::from_minor(100),
            &participants,
            Some(&[Decimal::ONE, Decimal::ZERO]),
        );
        assert!(matches!(result, Err(Error::InvalidWeights { .. })));

        let result = allocate(
            Money::from_minor(100),
            &participants,
            Some(&[Decimal::ONE, Decimal::NEGATIVE_ONE]),
        );
        assert!(matches!(result, Err(Error::InvalidWeights { .. })));
    }

    #[test]
    fn test_huge_weights_are_rejected_not_panicking() {
        let third = Decimal::from_str("0.3333333333333333333333333333").unwrap();
        let weights = [Decimal::from_str("3333333333333333333333333333").unwrap(), third, third];
        let result = allocate(Money::from_minor(99), &members(&[1, 2, 3]), Some(&weights));
        assert!(matches!(result, Err(Error::InvalidWeights { .. })));

        let weights = [Decimal::from(1_000_000_000_000_000_i64), Decimal::ONE];
        let result = allocate(
            Money::from_minor(1_000_000_000_000_000),
            &members(&[1, 2]),
            Some(&weights),
        );
        assert!(matches!(result, Err(Error::InvalidWeights { .. })));

        let weights = [Decimal::MAX, Decimal::MAX];
        let result = allocate(Money::from_minor(10), &members(&[1, 2]), Some(&weights));
        assert!(matches!(result, Err(Error::InvalidWeights { .. })));
    }

    #[test]
    fn test_largest_amount_splits_exactly() {
        let shares = allocate(Money::from_minor(i64::MAX), &members(&[1, 2, 3]), None).unwrap();
        let total = Money::checked_sum(shares.values().copied());
        assert_eq!(total, Some(Money::from_minor(i64::MAX)));
    }
}

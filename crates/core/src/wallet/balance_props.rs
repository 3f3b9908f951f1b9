//! Property-based tests for balance mutations.
//!
//! Accounts are modelled as plain `WalletBalance` values and driven through
//! random escrow, transfer and withdrawal flows.

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::wallet::balance::{BalanceMutation, WalletBalance};

/// Strategy for positive kobo-precision amounts up to 100k.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000).prop_map(|minor| Decimal::new(minor, 2))
}

fn arb_balance() -> impl Strategy<Value = WalletBalance> {
    (0i64..10_000_000, 0i64..10_000_000, 0i64..10_000_000).prop_map(|(a, e, t)| WalletBalance {
        available: Decimal::new(a, 2),
        escrow: Decimal::new(e, 2),
        in_transit: Decimal::new(t, 2),
    })
}

fn arb_mutation() -> impl Strategy<Value = BalanceMutation> {
    arb_amount().prop_flat_map(|a| {
        prop_oneof![
            Just(BalanceMutation::Credit(a)),
            Just(BalanceMutation::Debit(a)),
            Just(BalanceMutation::Hold(a)),
            Just(BalanceMutation::ReleaseEscrow(a)),
            Just(BalanceMutation::RefundEscrow(a)),
            Just(BalanceMutation::SendInTransit(a)),
            Just(BalanceMutation::SettleInTransit(a)),
            Just(BalanceMutation::ReturnInTransit(a)),
        ]
    })
}

/// Two-party flows that must conserve the combined total.
#[derive(Debug, Clone, Copy)]
enum Flow {
    Purchase(Decimal),
    Release(Decimal),
    Cancel(Decimal),
    Transfer(Decimal),
    Accept(Decimal),
    Reject(Decimal),
    DirectPayment(Decimal),
}

fn arb_flow() -> impl Strategy<Value = Flow> {
    arb_amount().prop_flat_map(|a| {
        prop_oneof![
            Just(Flow::Purchase(a)),
            Just(Flow::Release(a)),
            Just(Flow::Cancel(a)),
            Just(Flow::Transfer(a)),
            Just(Flow::Accept(a)),
            Just(Flow::Reject(a)),
            Just(Flow::DirectPayment(a)),
        ]
    })
}

/// Applies a payer mutation then a payee mutation; both or neither.
fn two_party(
    payer: &WalletBalance,
    payee: &WalletBalance,
    payer_m: BalanceMutation,
    payee_m: Option<BalanceMutation>,
) -> Option<(WalletBalance, WalletBalance)> {
    let next_payer = payer_m.apply(payer)?;
    let next_payee = match payee_m {
        Some(m) => m.apply(payee)?,
        None => *payee,
    };
    Some((next_payer, next_payee))
}

fn run_flow(a: &WalletBalance, b: &WalletBalance, flow: Flow) -> Option<(WalletBalance, WalletBalance)> {
    match flow {
        Flow::Purchase(x) => two_party(a, b, BalanceMutation::Hold(x), None),
        Flow::Release(x) => two_party(a, b, BalanceMutation::ReleaseEscrow(x), Some(BalanceMutation::Credit(x))),
        Flow::Cancel(x) => two_party(a, b, BalanceMutation::RefundEscrow(x), None),
        Flow::Transfer(x) => two_party(a, b, BalanceMutation::SendInTransit(x), None),
        Flow::Accept(x) => two_party(a, b, BalanceMutation::SettleInTransit(x), Some(BalanceMutation::Credit(x))),
        Flow::Reject(x) => two_party(a, b, BalanceMutation::ReturnInTransit(x), None),
        Flow::DirectPayment(x) => two_party(a, b, BalanceMutation::Debit(x), Some(BalanceMutation::Credit(x))),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A mutation either applies and keeps every field non-negative, or is refused.
    #[test]
    fn prop_no_negative_balance(start in arb_balance(), m in arb_mutation()) {
        match m.apply(&start) {
            Some(next) => prop_assert!(next.is_non_negative()),
            None => {
                let guard = m.guard().expect("only guarded mutations can be refused");
                let covered = match guard {
                    crate::wallet::balance::BalanceField::Available => start.available,
                    crate::wallet::balance::BalanceField::Escrow => start.escrow,
                    crate::wallet::balance::BalanceField::InTransit => start.in_transit,
                };
                prop_assert!(covered < m.amount());
            }
        }
    }

    /// Applied mutations change the total by exactly their net amount.
    #[test]
    fn prop_total_changes_by_net(start in arb_balance(), m in arb_mutation()) {
        if let Some(next) = m.apply(&start) {
            prop_assert_eq!(next.total() - start.total(), m.net());
        }
    }

    /// Escrow, transfer and direct-payment flows conserve the two-party total.
    #[test]
    fn prop_flows_conserve_total(
        a in arb_balance(),
        b in arb_balance(),
        flows in proptest::collection::vec(arb_flow(), 1..30),
    ) {
        let before = a.total() + b.total();
        let (mut a, mut b) = (a, b);
        for flow in flows {
            if let Some((na, nb)) = run_flow(&a, &b, flow) {
                a = na;
                b = nb;
            }
            prop_assert!(a.is_non_negative());
            prop_assert!(b.is_non_negative());
            prop_assert_eq!(a.total() + b.total(), before);
        }
    }

    /// Topup then withdraw of the same amount returns to the start.
    #[test]
    fn prop_credit_debit_round_trip(start in arb_balance(), x in arb_amount()) {
        let credited = BalanceMutation::Credit(x).apply(&start).unwrap();
        let back = BalanceMutation::Debit(x).apply(&credited).unwrap();
        prop_assert_eq!(back, start);
    }
}

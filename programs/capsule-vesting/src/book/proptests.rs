use proptest::prelude::*;

use super::*;
use crate::utils::math;

const T0: i64 = 1_000_000;
const USERS: usize = 3;

fn fail(e: anchor_lang::error::Error) -> TestCaseError {
    TestCaseError::fail(format!("{e:?}"))
}

#[derive(Clone, Debug)]
enum Op {
    Fill { schedule: u64, amount: u64 },
    Create { owner: usize, schedules: Vec<u64>, delay: i64 },
    Transfer { capsule: u64, to: usize },
    Withdraw { capsules: Vec<u64> },
    Leftovers { owner: usize },
    Advance { seconds: i64 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..2u64, 1..3_000u64).prop_map(|(schedule, amount)| Op::Fill { schedule, amount }),
        // Schedule id 2 does not exist.
        (0..USERS, prop::collection::vec(0..3u64, 1..4), 0..50i64)
            .prop_map(|(owner, schedules, delay)| Op::Create { owner, schedules, delay }),
        (0..16u64, 0..USERS).prop_map(|(capsule, to)| Op::Transfer { capsule, to }),
        prop::collection::vec(0..16u64, 1..4).prop_map(|capsules| Op::Withdraw { capsules }),
        (0..USERS).prop_map(|owner| Op::Leftovers { owner }),
        (0..400i64).prop_map(|seconds| Op::Advance { seconds }),
    ]
}

struct World {
    book: Book,
    mint: Pubkey,
    creator: Pubkey,
    users: Vec<Pubkey>,
    next_capsule: u64,
    funded: u64,
}

impl World {
    fn new() -> Self {
        let mint = Pubkey::new_unique();
        let creator = Pubkey::new_unique();
        let mut book = Book::new(T0);
        book.track_schedule(Schedule::new(0, mint, creator, 100, 1_000, 1, 0).unwrap());
        book.track_schedule(Schedule::new(1, mint, creator, 0, 300, 7, 0).unwrap());
        Self {
            book,
            mint,
            creator,
            users: (0..USERS).map(|_| Pubkey::new_unique()).collect(),
            next_capsule: 0,
            funded: 0,
        }
    }

    fn owner_or_first(&self, capsule_id: u64) -> Pubkey {
        self.book
            .capsule_owner_of(capsule_id)
            .unwrap_or(self.users[0])
    }

    fn apply(&mut self, op: &Op) -> std::result::Result<(), TestCaseError> {
        match op {
            Op::Fill { schedule, amount } => {
                if self.book.fill_reserves(*schedule, *amount).is_ok() {
                    self.funded += amount;
                }
            }
            Op::Create {
                owner,
                schedules,
                delay,
            } => {
                let creator = self.creator;
                let start = self.book.now() + delay;
                if let Ok(created) = self.book.create_multi_capsule(
                    self.next_capsule,
                    self.users[*owner],
                    schedules,
                    start,
                    &creator,
                ) {
                    self.next_capsule += created.len() as u64;
                }
            }
            Op::Transfer { capsule, to } => {
                let caller = self.owner_or_first(*capsule);
                let before = self.book.capsule(*capsule).cloned();
                if let Ok(s) = self.book.transfer_capsule(*capsule, self.users[*to], &caller) {
                    let before = before.expect("transferred an unknown capsule");
                    let schedule = self.book.schedule(before.schedule_id).map_err(fail)?.clone();
                    prop_assert_eq!(s.credited + s.remaining, before.remaining(&schedule));
                    prop_assert_eq!(self.book.vested_balance_of(*capsule).map_err(fail)?, 0);
                }
            }
            Op::Withdraw { capsules } => {
                let caller = self.owner_or_first(capsules[0]);
                let _ = self.book.withdraw_multi_capsule(capsules, &caller);
            }
            Op::Leftovers { owner } => {
                let owner = self.users[*owner];
                let _ = self.book.withdraw_leftovers(owner, self.mint, &owner);
            }
            Op::Advance { seconds } => {
                let now = self.book.now();
                self.book.set_now(now + seconds);
            }
        }
        Ok(())
    }

    fn check(&self) -> std::result::Result<(), TestCaseError> {
        for s in self.book.schedules() {
            let outstanding: u64 = self
                .book
                .capsule_slots()
                .filter_map(|(_, c)| c)
                .filter(|c| c.schedule_id == s.id)
                .map(|c| c.remaining(s))
                .sum();
            prop_assert_eq!(s.locked_reserves, outstanding);
            prop_assert!(s.locked_reserves <= s.total_reserves);
        }
        // Every funded unit is either paid out, still in a schedule pool,
        // or owed as leftover credit.
        let paid: u64 = self.book.payouts().iter().map(|p| p.amount).sum();
        let pooled: u64 = self.book.schedules().iter().map(|s| s.total_reserves).sum();
        let owed: u64 = self.book.leftovers().iter().map(|l| l.amount).sum();
        prop_assert_eq!(self.funded, paid + pooled + owed);
        for user in &self.users {
            for id in self.book.capsules_of(user) {
                prop_assert_eq!(self.book.capsule_owner_of(id).map_err(fail)?, *user);
            }
        }
        Ok(())
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn reserve_accounting_holds_under_random_operations(ops in prop::collection::vec(op(), 1..80)) {
        let mut world = World::new();
        for op in &ops {
            world.apply(op)?;
            world.check()?;
        }
    }

    #[test]
    fn vested_amount_is_monotone_and_reaches_amount(
        cliff_frac in 0u64..100,
        duration in 1u64..10_000,
        rate in 1u64..1_000_000,
        a in 0i64..20_000,
        b in 0i64..20_000,
    ) {
        let cliff = duration * cliff_frac / 100;
        let (t1, t2) = if a <= b { (a, b) } else { (b, a) };
        let v1 = math::vested_amount(cliff, duration, rate, 0, 0, t1).map_err(fail)?;
        let v2 = math::vested_amount(cliff, duration, rate, 0, 0, t2).map_err(fail)?;
        prop_assert!(v1 <= v2);
        let end = duration as i64;
        prop_assert_eq!(
            math::vested_amount(cliff, duration, rate, 0, 0, end).map_err(fail)?,
            rate * duration
        );
    }

    #[test]
    fn multi_create_equals_sequential_creates(schedules in prop::collection::vec(0..3u64, 1..MAX_BATCH)) {
        let mut world = World::new();
        world.book.fill_reserves(0, 2_500).unwrap();
        world.book.fill_reserves(1, 4_200).unwrap();
        let (owner, creator) = (world.users[1], world.creator);

        let mut batched = world.book.clone();
        let mut sequential = world.book.clone();
        let batch = batched.create_multi_capsule(0, owner, &schedules, T0, &creator);
        let seq: Result<Vec<Capsule>> = (0u64..)
            .zip(&schedules)
            .map(|(id, s)| sequential.create_capsule(id, owner, *s, T0, &creator))
            .collect();

        match (batch, seq) {
            (Ok(b), Ok(s)) => {
                prop_assert_eq!(b, s);
                prop_assert_eq!(batched, sequential);
            }
            (Err(_), Err(_)) => prop_assert_eq!(batched, world.book),
            (b, s) => prop_assert!(false, "batch {:?} vs sequential {:?}", b, s),
        }
    }
}

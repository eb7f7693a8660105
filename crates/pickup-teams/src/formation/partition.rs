// Balanced partition: split a player pool into two rosters.
//
// Greedy heuristic, not optimal bin partitioning:
// 1. Collapse pairs into atomic units.
// 2. Sort units by per-member average rating, descending.
// 3. Give each unit to the team with the lower running rating sum (ties: the
//    smaller roster, then team 1), subject to the target roster sizes.
// 4. Goalkeeper fix-up: while one team is below the per-team minimum and
//    the other has a keeper to spare, move the weakest unpaired one across.
//
// Saved formations and draft results are compared against this heuristic, so
// its tie-break order is part of its contract.

use std::cmp::Ordering;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use super::constraints::ConstraintSet;
use super::error::{FormationError, NoGoalkeeperWarning};
use super::player::{DraftPlayer, TeamSlot};

/// Tuning knobs for a partition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionOptions {
    /// Target size of team 1. `None` splits as evenly as parity allows,
    /// with team 1 taking the extra player.
    pub team1_size: Option<usize>,
    /// Minimum goalkeepers each side should field. Sides left below it get
    /// a warning. 0 disables the goalkeeper fix-up and its warnings.
    pub goalkeepers_per_team: usize,
}

impl Default for PartitionOptions {
    fn default() -> Self {
        PartitionOptions {
            team1_size: None,
            goalkeepers_per_team: 1,
        }
    }
}

/// Two rosters plus any advisory warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub team1: Vec<DraftPlayer>,
    pub team2: Vec<DraftPlayer>,
    pub warnings: Vec<NoGoalkeeperWarning>,
}

impl Partition {
    pub fn roster(&self, slot: TeamSlot) -> &[DraftPlayer] {
        match slot {
            TeamSlot::Team1 => &self.team1,
            TeamSlot::Team2 => &self.team2,
        }
    }
}

/// A single player or a pair that must be placed together.
#[derive(Debug, Clone)]
struct Unit<'a> {
    members: Vec<&'a DraftPlayer>,
    average: f64,
}

impl Unit<'_> {
    fn size(&self) -> usize {
        self.members.len()
    }

    fn rating_sum(&self) -> f64 {
        self.members.iter().map(|p| p.overall_rating).sum()
    }

    /// Rating rounded to the nearest 0.5, as an integer count of halves.
    fn shuffle_bucket(&self) -> i64 {
        (self.average * 2.0).round() as i64
    }
}

/// Deterministic balanced partition.
pub fn partition(
    pool: &[DraftPlayer],
    constraints: &ConstraintSet,
    options: &PartitionOptions,
) -> Result<Partition, FormationError> {
    let units = prepare_units(pool, constraints)?;
    Ok(assign_units(pool.len(), units, constraints, options))
}

/// Like [`partition`], but units in the same 0.5 rating bucket are randomly
/// permuted first, so repeated runs over one pool can yield different but
/// equally balanced splits. The order between buckets is preserved.
pub fn shuffle_partition<R: Rng + ?Sized>(
    pool: &[DraftPlayer],
    constraints: &ConstraintSet,
    options: &PartitionOptions,
    rng: &mut R,
) -> Result<Partition, FormationError> {
    let mut units = prepare_units(pool, constraints)?;

    let mut start = 0;
    while start < units.len() {
        let bucket = units[start].shuffle_bucket();
        let end = units[start..]
            .iter()
            .position(|u| u.shuffle_bucket() != bucket)
            .map_or(units.len(), |offset| start + offset);
        units[start..end].shuffle(rng);
        start = end;
    }

    Ok(assign_units(pool.len(), units, constraints, options))
}

/// Validate inputs, collapse pairs and sort units by average rating.
fn prepare_units<'a>(
    pool: &'a [DraftPlayer],
    constraints: &ConstraintSet,
) -> Result<Vec<Unit<'a>>, FormationError> {
    if pool.len() < 2 {
        return Err(FormationError::InsufficientPlayers { found: pool.len() });
    }
    constraints.validate_against(pool)?;

    let mut consumed = vec![false; pool.len()];
    let mut units = Vec::with_capacity(pool.len());

    for (idx, player) in pool.iter().enumerate() {
        if consumed[idx] {
            continue;
        }
        consumed[idx] = true;

        let mut members = vec![player];
        if let Some(partner_id) = constraints.partner_of(&player.id) {
            if let Some(partner_idx) = pool.iter().position(|p| p.id == partner_id) {
                if !consumed[partner_idx] {
                    consumed[partner_idx] = true;
                    members.push(&pool[partner_idx]);
                }
            }
        }

        let average = members.iter().map(|p| p.overall_rating).sum::<f64>() / members.len() as f64;
        units.push(Unit { members, average });
    }

    units.sort_by(|a, b| {
        b.average
            .partial_cmp(&a.average)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.members[0].id.cmp(&b.members[0].id))
    });

    Ok(units)
}

/// Running totals for one side during greedy assignment.
#[derive(Debug, Default)]
struct Side<'a> {
    players: Vec<&'a DraftPlayer>,
    rating_sum: f64,
    capacity: usize,
}

impl<'a> Side<'a> {
    fn fits(&self, unit: &Unit<'_>) -> bool {
        self.players.len() + unit.size() <= self.capacity
    }

    fn push(&mut self, unit: &Unit<'a>) {
        self.players.extend(unit.members.iter().copied());
        self.rating_sum += unit.rating_sum();
    }
}

fn assign_units(
    pool_size: usize,
    units: Vec<Unit<'_>>,
    constraints: &ConstraintSet,
    options: &PartitionOptions,
) -> Partition {
    let team1_capacity = options
        .team1_size
        .unwrap_or_else(|| pool_size.div_ceil(2))
        .min(pool_size);
    let mut sides = [
        Side {
            capacity: team1_capacity,
            ..Side::default()
        },
        Side {
            capacity: pool_size - team1_capacity,
            ..Side::default()
        },
    ];

    for unit in &units {
        let preferred = preferred_side(&sides);
        let target = if sides[preferred.index()].fits(unit) {
            preferred
        } else if sides[preferred.other().index()].fits(unit) {
            preferred.other()
        } else {
            // Pair units can make the exact split impossible; overflow into
            // the smaller roster.
            let (a, b) = (&sides[0], &sides[1]);
            if b.players.len() < a.players.len() {
                TeamSlot::Team2
            } else {
                TeamSlot::Team1
            }
        };
        sides[target.index()].push(unit);
    }

    let [side1, side2] = sides;
    let mut team1: Vec<DraftPlayer> = side1.players.into_iter().cloned().collect();
    let mut team2: Vec<DraftPlayer> = side2.players.into_iter().cloned().collect();

    let mut warnings = Vec::new();
    let required = options.goalkeepers_per_team;
    if required > 0 {
        goalkeeper_fixup(&mut team1, &mut team2, required, constraints, &mut warnings);
        for (slot, roster) in [(TeamSlot::Team1, &team1), (TeamSlot::Team2, &team2)] {
            let already_warned = warnings.iter().any(|w| w.slot == slot);
            let goalkeepers = keeper_count(roster);
            if !already_warned && goalkeepers < required {
                warnings.push(NoGoalkeeperWarning {
                    slot,
                    goalkeepers,
                    required,
                    blocked_by_pair: false,
                });
            }
        }
        for w in &warnings {
            warn!("{}", w);
        }
    }

    debug!(
        "Partitioned {} players into {} + {}",
        pool_size,
        team1.len(),
        team2.len()
    );

    Partition {
        team1,
        team2,
        warnings,
    }
}

/// Lower running sum wins; ties go to the smaller roster, then team 1.
fn preferred_side(sides: &[Side<'_>; 2]) -> TeamSlot {
    let (a, b) = (&sides[0], &sides[1]);
    match a.rating_sum.partial_cmp(&b.rating_sum) {
        Some(Ordering::Less) => TeamSlot::Team1,
        Some(Ordering::Greater) => TeamSlot::Team2,
        _ => {
            if b.players.len() < a.players.len() {
                TeamSlot::Team2
            } else {
                TeamSlot::Team1
            }
        }
    }
}

fn keeper_count(team: &[DraftPlayer]) -> usize {
    team.iter().filter(|p| p.is_goalkeeper()).count()
}

fn goalkeeper_fixup(
    team1: &mut Vec<DraftPlayer>,
    team2: &mut Vec<DraftPlayer>,
    required: usize,
    constraints: &ConstraintSet,
    warnings: &mut Vec<NoGoalkeeperWarning>,
) {
    // Each move brings the deficient side one keeper closer to the minimum
    // and never takes the other side below it.
    loop {
        let (count1, count2) = (keeper_count(team1), keeper_count(team2));
        let (deficient_slot, deficient, surplus) = if count1 < required && count2 > required {
            (TeamSlot::Team1, &mut *team1, &mut *team2)
        } else if count2 < required && count1 > required {
            (TeamSlot::Team2, &mut *team2, &mut *team1)
        } else {
            return;
        };

        if !move_spare_keeper(deficient_slot, deficient, surplus, constraints) {
            info!(
                "Goalkeeper fix-up stopped for {}: every spare goalkeeper is paired",
                deficient_slot
            );
            warnings.push(NoGoalkeeperWarning {
                slot: deficient_slot,
                goalkeepers: keeper_count(deficient),
                required,
                blocked_by_pair: true,
            });
            return;
        }
    }
}

/// Move the weakest unpaired keeper from `surplus` to `deficient`. Returns
/// `false` when every keeper in `surplus` is paired.
fn move_spare_keeper(
    deficient_slot: TeamSlot,
    deficient: &mut Vec<DraftPlayer>,
    surplus: &mut Vec<DraftPlayer>,
    constraints: &ConstraintSet,
) -> bool {
    // Weakest goalkeeper that is free to move on its own.
    let candidate = surplus
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_goalkeeper() && !constraints.is_paired(&p.id))
        .min_by(|(_, a), (_, b)| {
            a.overall_rating
                .partial_cmp(&b.overall_rating)
                .unwrap_or(Ordering::Equal)
        })
        .map(|(idx, _)| idx);

    let Some(idx) = candidate else {
        return false;
    };

    let keeper = surplus.remove(idx);
    info!(
        "Goalkeeper fix-up: moving '{}' ({:.1}) to {}",
        keeper.name, keeper.overall_rating, deficient_slot
    );
    let keeper_rating = keeper.overall_rating;
    deficient.push(keeper);

    // Keep roster sizes within one of each other by sending back the
    // unpaired line player closest in rating to the moved keeper.
    if deficient.len() > surplus.len() + 1 {
        let returning = deficient
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_goalkeeper() && !constraints.is_paired(&p.id))
            .min_by(|(_, a), (_, b)| {
                let da = (a.overall_rating - keeper_rating).abs();
                let db = (b.overall_rating - keeper_rating).abs();
                da.partial_cmp(&db)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .map(|(idx, _)| idx);

        if let Some(idx) = returning {
            let player = deficient.remove(idx);
            debug!(
                "Goalkeeper fix-up: returning '{}' ({:.1}) to keep sizes even",
                player.name, player.overall_rating
            );
            surplus.push(player);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formation::player::Position;
    use crate::formation::strength::compute_strength;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn line(id: &str, rating: f64) -> DraftPlayer {
        DraftPlayer::new(id, id, Position::Line, rating)
    }

    fn keeper(id: &str, rating: f64) -> DraftPlayer {
        DraftPlayer::new(id, id, Position::Goalkeeper, rating)
    }

    fn ids(roster: &[DraftPlayer]) -> Vec<&str> {
        roster.iter().map(|p| p.id.as_str()).collect()
    }

    fn sum(roster: &[DraftPlayer]) -> f64 {
        roster.iter().map(|p| p.overall_rating).sum()
    }

    fn ten_line_players() -> Vec<DraftPlayer> {
        [5.0, 5.0, 4.0, 4.0, 3.0, 3.0, 2.0, 2.0, 1.0, 1.0]
            .iter()
            .enumerate()
            .map(|(i, r)| line(&format!("p{i}"), *r))
            .collect()
    }

    fn no_keepers() -> PartitionOptions {
        PartitionOptions {
            goalkeepers_per_team: 0,
            ..PartitionOptions::default()
        }
    }

    #[test]
    fn rejects_pools_smaller_than_two() {
        let err = partition(&[line("a", 3.0)], &ConstraintSet::new(), &PartitionOptions::default())
            .unwrap_err();
        assert!(matches!(err, FormationError::InsufficientPlayers { found: 1 }));

        let err = partition(&[], &ConstraintSet::new(), &PartitionOptions::default()).unwrap_err();
        assert!(matches!(err, FormationError::InsufficientPlayers { found: 0 }));
    }

    #[test]
    fn rejects_stale_constraints() {
        let pool = vec![line("a", 3.0), line("b", 2.0), line("c", 1.0)];
        let mut constraints = ConstraintSet::new();
        constraints.add_pair(&pool, "a", "c").unwrap();
        let shrunk = vec![pool[0].clone(), pool[1].clone()];
        let err = partition(&shrunk, &constraints, &PartitionOptions::default()).unwrap_err();
        assert!(matches!(err, FormationError::StaleConstraint { player_id } if player_id == "c"));
    }

    #[test]
    fn ten_line_players_split_perfectly() {
        let pool = ten_line_players();
        let result = partition(&pool, &ConstraintSet::new(), &no_keepers()).unwrap();
        assert_eq!(sum(&result.team1), 15.0);
        assert_eq!(sum(&result.team2), 15.0);
        assert_eq!(result.team1.len(), 5);
        assert_eq!(result.team2.len(), 5);

        let s1 = compute_strength(&result.team1);
        let s2 = compute_strength(&result.team2);
        assert_eq!(s1.difference_percent(&s2), 0.0);
    }

    #[test]
    fn union_of_rosters_equals_pool() {
        let pool: Vec<DraftPlayer> = (0..11)
            .map(|i| line(&format!("p{i:02}"), (i % 5) as f64 + 0.5))
            .collect();
        let result = partition(&pool, &ConstraintSet::new(), &no_keepers()).unwrap();

        let mut all: Vec<&str> = ids(&result.team1);
        all.extend(ids(&result.team2));
        let unique: HashSet<&str> = all.iter().copied().collect();
        assert_eq!(all.len(), pool.len());
        assert_eq!(unique.len(), pool.len());
        assert_eq!(result.team1.len(), 6);
        assert_eq!(result.team2.len(), 5);
    }

    #[test]
    fn sizes_stay_even_when_one_player_dominates() {
        let pool = vec![line("a", 5.0), line("b", 1.0), line("c", 1.0), line("d", 1.0)];
        let result = partition(&pool, &ConstraintSet::new(), &no_keepers()).unwrap();
        assert_eq!(result.team1.len(), 2);
        assert_eq!(result.team2.len(), 2);
        assert_eq!(ids(&result.team1), vec!["a", "d"]);
    }

    #[test]
    fn explicit_target_size_is_respected() {
        let pool = ten_line_players();
        let options = PartitionOptions {
            team1_size: Some(4),
            goalkeepers_per_team: 0,
        };
        let result = partition(&pool, &ConstraintSet::new(), &options).unwrap();
        assert_eq!(result.team1.len(), 4);
        assert_eq!(result.team2.len(), 6);
    }

    #[test]
    fn pairs_always_share_a_team() {
        let pool = ten_line_players();
        let mut constraints = ConstraintSet::new();
        constraints.add_pair(&pool, "p0", "p1").unwrap();
        constraints.add_pair(&pool, "p8", "p3").unwrap();
        let result = partition(&pool, &constraints, &no_keepers()).unwrap();

        for pair in constraints.pairs() {
            let in_team1 = |id: &str| result.team1.iter().any(|p| p.id == id);
            assert_eq!(
                in_team1(&pair.player1_id),
                in_team1(&pair.player2_id),
                "pair {:?} was split",
                pair
            );
        }
        assert_eq!(result.team1.len() + result.team2.len(), pool.len());
    }

    #[test]
    fn single_goalkeeper_warns_for_the_other_team() {
        let mut pool: Vec<DraftPlayer> = (0..9).map(|i| line(&format!("l{i}"), 2.0 + (i % 3) as f64)).collect();
        pool.push(keeper("gk", 3.0));
        let result = partition(&pool, &ConstraintSet::new(), &PartitionOptions::default()).unwrap();

        let s1 = compute_strength(&result.team1);
        let s2 = compute_strength(&result.team2);
        assert_ne!(s1.has_goalkeeper, s2.has_goalkeeper);

        let keeperless = if s1.has_goalkeeper { TeamSlot::Team2 } else { TeamSlot::Team1 };
        assert_eq!(
            result.warnings,
            vec![NoGoalkeeperWarning {
                slot: keeperless,
                goalkeepers: 0,
                required: 1,
                blocked_by_pair: false
            }]
        );
    }

    #[test]
    fn fixup_moves_weakest_keeper_and_rebalances_sizes() {
        let pool = vec![
            line("s1", 5.0),
            line("s2", 5.0),
            keeper("g1", 3.0),
            keeper("g2", 3.0),
            line("l1", 2.0),
            line("l2", 2.0),
        ];
        let mut constraints = ConstraintSet::new();
        constraints.add_pair(&pool, "s1", "s2").unwrap();

        let result = partition(&pool, &constraints, &PartitionOptions::default()).unwrap();
        // Greedy puts the pair + l2 on team 1 and both keepers on team 2;
        // the fix-up sends g1 over and l2 back.
        assert_eq!(ids(&result.team1), vec!["s1", "s2", "g1"]);
        assert_eq!(ids(&result.team2), vec!["g2", "l1", "l2"]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn paired_keepers_block_fixup_with_warning() {
        let pool = vec![
            line("s1", 5.0),
            line("s2", 5.0),
            keeper("g1", 3.0),
            keeper("g2", 3.0),
            line("l1", 2.0),
            line("l2", 2.0),
        ];
        let mut constraints = ConstraintSet::new();
        constraints.add_pair(&pool, "s1", "s2").unwrap();
        constraints.add_pair(&pool, "g1", "g2").unwrap();

        let result = partition(&pool, &constraints, &PartitionOptions::default()).unwrap();
        let keepers_in_team1 = result.team1.iter().filter(|p| p.is_goalkeeper()).count();
        let keepers_in_team2 = result.team2.iter().filter(|p| p.is_goalkeeper()).count();
        assert_eq!(keepers_in_team1 + keepers_in_team2, 2);
        assert!(keepers_in_team1 == 0 || keepers_in_team2 == 0);

        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].blocked_by_pair);
    }

    #[test]
    fn warns_for_each_side_below_the_keeper_minimum() {
        let mut pool: Vec<DraftPlayer> = (0..8).map(|i| line(&format!("l{i}"), 3.0)).collect();
        pool.push(keeper("g1", 3.0));
        pool.push(keeper("g2", 3.0));
        let options = PartitionOptions {
            goalkeepers_per_team: 2,
            ..PartitionOptions::default()
        };

        let result = partition(&pool, &ConstraintSet::new(), &options).unwrap();
        assert_eq!(result.warnings.len(), 2);
        for w in &result.warnings {
            assert_eq!(w.goalkeepers, 1);
            assert_eq!(w.required, 2);
            assert!(!w.blocked_by_pair);
        }
    }

    #[test]
    fn fixup_tops_up_to_the_keeper_minimum() {
        // Greedy order s1, g1..g4, l1: team 1 gets s1 + l1 + one keeper,
        // team 2 gets three keepers. With a minimum of 2 one keeper moves.
        let pool = vec![
            line("s1", 5.0),
            keeper("g1", 4.0),
            keeper("g2", 3.0),
            keeper("g3", 2.5),
            keeper("g4", 2.0),
            line("l1", 1.0),
        ];
        let options = PartitionOptions {
            goalkeepers_per_team: 2,
            ..PartitionOptions::default()
        };

        let result = partition(&pool, &ConstraintSet::new(), &options).unwrap();
        let count = |team: &[DraftPlayer]| team.iter().filter(|p| p.is_goalkeeper()).count();
        assert_eq!(count(&result.team1), 2);
        assert_eq!(count(&result.team2), 2);
        assert!(result.warnings.is_empty());
        assert_eq!(result.team1.len(), 3);
        assert_eq!(result.team2.len(), 3);
    }

    #[test]
    fn keeper_warnings_disabled_when_not_required() {
        let pool = ten_line_players();
        let result = partition(&pool, &ConstraintSet::new(), &no_keepers()).unwrap();
        assert!(result.warnings.is_empty());

        let result = partition(&pool, &ConstraintSet::new(), &PartitionOptions::default()).unwrap();
        assert_eq!(result.warnings.len(), 2);
    }

    #[test]
    fn partition_is_deterministic() {
        let pool = ten_line_players();
        let a = partition(&pool, &ConstraintSet::new(), &no_keepers()).unwrap();
        let b = partition(&pool, &ConstraintSet::new(), &no_keepers()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn shuffle_keeps_balance_and_membership() {
        let pool = ten_line_players();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let result =
                shuffle_partition(&pool, &ConstraintSet::new(), &no_keepers(), &mut rng).unwrap();
            assert_eq!(sum(&result.team1), 15.0);
            assert_eq!(sum(&result.team2), 15.0);
            assert_eq!(result.team1.len() + result.team2.len(), 10);
        }
    }

    #[test]
    fn shuffle_produces_different_splits() {
        let pool = ten_line_players();
        let mut rng = StdRng::seed_from_u64(42);
        let splits: HashSet<Vec<String>> = (0..40)
            .map(|_| {
                let result =
                    shuffle_partition(&pool, &ConstraintSet::new(), &no_keepers(), &mut rng)
                        .unwrap();
                let mut team1: Vec<String> = result.team1.iter().map(|p| p.id.clone()).collect();
                team1.sort();
                team1
            })
            .collect();
        assert!(splits.len() > 1);
    }

    #[test]
    fn shuffle_never_reorders_buckets() {
        // One clear star: they always land on team 1 as the first unit.
        let mut pool = vec![line("star", 5.0)];
        pool.extend((0..5).map(|i| line(&format!("p{i}"), 2.0)));
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..10 {
            let result =
                shuffle_partition(&pool, &ConstraintSet::new(), &no_keepers(), &mut rng).unwrap();
            assert_eq!(result.team1[0].id, "star");
        }
    }
}

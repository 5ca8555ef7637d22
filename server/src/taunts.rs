use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

pub const TAUNTS: [&str; 11] = [
    "what up bish",
    "u are a joke",
    "what a scrub",
    "u got no chance",
    "damn im SO smart",
    "HA what now",
    "u can go home",
    "thanks for wasting my time",
    "can i play with someone else",
    "u should feel bad",
    "stop crying",
];

pub fn random_taunt() -> &'static str {
    pick_taunt(&mut thread_rng())
}

pub fn pick_taunt<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    TAUNTS.choose(rng).copied().unwrap_or(TAUNTS[0])
}

pub use string_cache::DefaultAtom as Atom;

/// Interned name of a block store (epoch or snip), e.g. `TriS` or `CSPK`
pub type EpochName = Atom;

/// Intern a store name
pub fn epoch_name(s: &str) -> EpochName {
    Atom::from(s)
}

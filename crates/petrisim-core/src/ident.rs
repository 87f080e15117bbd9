macro_rules! identifier {
    ($(#[$meta: meta])* $name: ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Default,
            Copy,
            Clone,
            PartialOrd,
            Ord,
            PartialEq,
            Eq,
            Hash,
            derive_more::Display,
            derive_more::FromStr,
            serde::Serialize,
            serde::Deserialize,
        )]
        pub struct $name(usize);

        impl $name {
            /// ID 0.
            pub const ZERO: $name = Self::new(0);

            /// Creates a new ID.
            pub const fn new(val: usize) -> Self {
                Self(val)
            }

            /// Returns the position this ID stands for.
            pub const fn index(self) -> usize {
                self.0
            }
        }
    };
}

identifier!(
    /// The position of a net inside a [`CompositeModel`](crate::model::CompositeModel).
    NetId
);

identifier!(
    /// A place slot local to one [`Net`](crate::net::Net).
    PlaceId
);

identifier!(
    /// A transition slot local to one [`Net`](crate::net::Net).
    TransitionId
);

identifier!(
    /// A canonical place in a composite model. Every aliased slot resolves to the same key.
    PlaceKey
);

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::{
    base::{
        function::{Function, FunctionRef},
        record::{RecordType, RecordTypeRef},
    },
    utils::ref_id::ArcId,
};

/// Registry of receiver methods keyed by (receiver-type identity, method name).
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    methods: HashMap<(ArcId<RecordType>, String), FunctionRef>,
    stringers: HashMap<ArcId<RecordType>, FunctionRef>,
    attached: HashSet<ArcId<Function>>,
}

impl MethodTable {
    /// Attaches `function` to `ty` under its own name.
    ///
    /// Returns `false` without touching the table if this exact function was
    /// attached before. A function named `stringer` also becomes the
    /// representation hook of `ty`.
    pub fn attach(&mut self, ty: &RecordTypeRef, function: &FunctionRef, stringer: &str) -> bool {
        if !self.attached.insert(ArcId::new(function)) {
            return false;
        }

        debug!("Attaching `{}` as a method of `{}`", function.name(), ty.name());
        self.methods.insert(
            (ArcId::new(ty), function.name().to_string()),
            FunctionRef::clone(function),
        );

        if function.name() == stringer {
            self.stringers
                .insert(ArcId::new(ty), FunctionRef::clone(function));
        }

        true
    }

    pub fn is_attached(&self, function: &FunctionRef) -> bool {
        self.attached.contains(&ArcId::new(function))
    }

    pub fn get(&self, ty: &RecordTypeRef, name: &str) -> Option<&FunctionRef> {
        self.methods.get(&(ArcId::new(ty), name.to_string()))
    }

    /// Representation hook of `ty`, if one was attached.
    pub fn stringer(&self, ty: &RecordTypeRef) -> Option<&FunctionRef> {
        self.stringers.get(&ArcId::new(ty))
    }

    /// Methods of `ty` sorted by name.
    pub fn methods_of(&self, ty: &RecordTypeRef) -> Vec<(&str, &FunctionRef)> {
        let key = ArcId::new(ty);
        let mut methods: Vec<_> = self
            .methods
            .iter()
            .filter(|((owner, _), _)| *owner == key)
            .map(|((_, name), function)| (name.as_str(), function))
            .collect();
        methods.sort_by_key(|(name, _)| *name);
        methods
    }

    /// Points every entry holding `original` at `replacement` instead, and
    /// marks `replacement` as attached. Returns the number of entries updated.
    pub(crate) fn replace(&mut self, original: &FunctionRef, replacement: &FunctionRef) -> usize {
        let mut replaced = 0;
        for function in self.methods.values_mut().chain(self.stringers.values_mut()) {
            if FunctionRef::ptr_eq(function, original) {
                *function = FunctionRef::clone(replacement);
                replaced += 1;
            }
        }

        self.attached.insert(ArcId::new(replacement));
        replaced
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

use crate::event::{CodeEvent, CodeKind, KindSet};
use config::AcceptList;
use educe::Educe;
use std::sync::Arc;
use tracing::warn;

pub type Predicate = Arc<dyn Fn(&CodeEvent) -> bool + Send + Sync>;

/// Which events a capture records.
#[derive(Clone, Default, Educe)]
#[educe(Debug)]
pub enum Accept {
    /// Record every event.
    #[default]
    All,
    /// Record events whose kind is in the set. An empty set records nothing.
    AllowList(KindSet),
    /// Record events the predicate returns `true` for.
    Predicate(#[educe(Debug(ignore))] Predicate),
}

impl Accept {
    /// Normalize the configured accept list. `None` accepts everything.
    ///
    /// Names outside the known kinds can never match an event; they are
    /// ignored with a warning and the remaining names still apply.
    pub fn from_config(accept: Option<&AcceptList>) -> Self {
        let Some(list) = accept else {
            return Self::All;
        };
        let kinds = list
            .names()
            .into_iter()
            .filter_map(|name| match name.parse::<CodeKind>() {
                Ok(kind) => Some(kind),
                Err(err) => {
                    warn!(%err, "ignoring accept list entry");
                    None
                }
            })
            .collect();
        Self::AllowList(kinds)
    }

    pub fn predicate(predicate: impl Fn(&CodeEvent) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(predicate))
    }
}

impl From<KindSet> for Accept {
    fn from(kinds: KindSet) -> Self {
        Self::AllowList(kinds)
    }
}

/// Decides per event whether it is recorded.
///
/// Runs on whichever thread delivers the event, so it must stay cheap and
/// free of side effects.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    accept: Accept,
}

impl EventFilter {
    pub fn new(accept: Accept) -> Self {
        Self { accept }
    }

    #[inline]
    pub fn should_record(&self, event: &CodeEvent) -> bool {
        match &self.accept {
            Accept::All => true,
            Accept::AllowList(kinds) => kinds.contains_kind(event.kind),
            Accept::Predicate(predicate) => predicate(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_kind() -> impl Strategy<Value = CodeKind> {
        prop::sample::select(CodeKind::ALL.to_vec())
    }

    fn any_event() -> impl Strategy<Value = CodeEvent> {
        (any_kind(), any::<u64>(), any::<u64>(), ".*", ".*").prop_map(
            |(kind, address, size, function_name, script_name)| {
                CodeEvent::new(kind, address, size)
                    .with_function_name(function_name)
                    .with_script(script_name, 1, 1)
            },
        )
    }

    #[test]
    fn unset_accept_list_records_everything() {
        let filter = EventFilter::new(Accept::from_config(None));
        for kind in CodeKind::ALL {
            assert!(filter.should_record(&CodeEvent::new(kind, 0, 0)));
        }
    }

    #[test]
    fn empty_accept_list_records_nothing() {
        for list in [AcceptList::from(""), AcceptList::List(vec![])] {
            let filter = EventFilter::new(Accept::from_config(Some(&list)));
            for kind in CodeKind::ALL {
                assert!(!filter.should_record(&CodeEvent::new(kind, 0, 0)));
            }
        }
    }

    #[test]
    fn csv_accept_list() {
        let list = AcceptList::from("Function,Script");
        let filter = EventFilter::new(Accept::from_config(Some(&list)));
        assert!(filter.should_record(&CodeEvent::new(CodeKind::Function, 0, 0)));
        assert!(filter.should_record(&CodeEvent::new(CodeKind::Script, 0, 0)));
        assert!(!filter.should_record(&CodeEvent::new(CodeKind::Builtin, 0, 0)));
    }

    #[test]
    fn unknown_kind_in_config_never_matches() {
        let list = AcceptList::from("Function,Lambda");
        let accept = Accept::from_config(Some(&list));
        assert!(matches!(accept, Accept::AllowList(kinds) if kinds == KindSet::FUNCTION));

        let filter = EventFilter::new(Accept::from_config(Some(&list)));
        assert!(filter.should_record(&CodeEvent::new(CodeKind::Function, 0, 0)));
        assert!(!filter.should_record(&CodeEvent::new(CodeKind::Builtin, 0, 0)));
    }

    #[test]
    fn only_unknown_kinds_records_nothing() {
        let list = AcceptList::from("Lambda,Other");
        let filter = EventFilter::new(Accept::from_config(Some(&list)));
        for kind in CodeKind::ALL {
            assert!(!filter.should_record(&CodeEvent::new(kind, 0, 0)));
        }
    }

    #[test]
    fn predicate_sees_every_field() {
        let filter = EventFilter::new(Accept::predicate(|event| {
            event.script_name.ends_with(".js") && event.size > 8
        }));
        let event = CodeEvent::new(CodeKind::LazyCompile, 0x10, 16).with_script("a.js", 1, 1);
        assert!(filter.should_record(&event));
        assert!(!filter.should_record(&event.clone().with_script("a.mjs", 1, 1)));
        assert!(!filter.should_record(&CodeEvent::new(CodeKind::LazyCompile, 0x10, 4)));
    }

    #[test]
    fn predicate_is_not_printed() {
        let accept = Accept::predicate(|_| true);
        assert!(format!("{accept:?}").starts_with("Predicate"));
    }

    proptest! {
        #[test]
        fn allow_list_is_membership(
            event in any_event(),
            kinds in prop::collection::vec(any_kind(), 0..12),
        ) {
            let set: KindSet = kinds.iter().copied().collect();
            let filter = EventFilter::new(set.into());
            prop_assert_eq!(filter.should_record(&event), kinds.contains(&event.kind));
        }

        #[test]
        fn default_filter_records_everything(event in any_event()) {
            prop_assert!(EventFilter::default().should_record(&event));
        }
    }
}

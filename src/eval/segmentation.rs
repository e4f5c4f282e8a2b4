use crate::eval::distributor::{BucketDistributor, MurmurBucketDistributor};
use crate::eval::evaluator::{eval_number_rule, eval_string_rule};
use crate::eval::selector::VersionSelector;
use crate::model::flag::{Flag, FlagCatalogue, Segment};
use crate::user::UserContext;
use log::debug;
use std::sync::Arc;

/// Resolves a flag catalogue against a [`UserContext`].
///
/// For every flag:
/// - an inactive flag, or one without segments, keeps its base `active` value,
/// - otherwise the flag is active when any of its segments matches; a segment
///   matches when its rollout bucket is within `rollout_percentage` and all of its
///   string and number rules pass,
/// - a version is selected regardless of the activation outcome.
///
/// # Examples
///
/// ```rust
/// use featurit::{Flag, FlagCatalogue, SegmentationService, UserContext};
///
/// let mut catalogue = FlagCatalogue::new();
/// catalogue.insert("Simple".to_owned(), Flag {
///     name: "Simple".to_owned(),
///     active: true,
///     distribution_attribute: "userId".to_owned(),
///     segments: vec![],
///     versions: vec![],
///     selected_version: None,
/// });
///
/// let resolved = SegmentationService::default().execute(&catalogue, &UserContext::new());
/// assert!(resolved["Simple"].active);
/// ```
pub struct SegmentationService {
    distributor: Arc<dyn BucketDistributor>,
    selector: VersionSelector,
}

impl Default for SegmentationService {
    fn default() -> Self {
        let distributor: Arc<dyn BucketDistributor> = Arc::new(MurmurBucketDistributor::new());
        Self::new(Arc::clone(&distributor), VersionSelector::new(distributor))
    }
}

impl SegmentationService {
    /// Creates a new [`SegmentationService`]. `distributor` drives the rollout gates,
    /// `selector` the version selection.
    pub fn new(distributor: Arc<dyn BucketDistributor>, selector: VersionSelector) -> Self {
        Self {
            distributor,
            selector,
        }
    }

    /// Returns a freshly built, resolved copy of `catalogue`.
    pub fn execute(&self, catalogue: &FlagCatalogue, ctx: &UserContext) -> FlagCatalogue {
        let mut resolved = FlagCatalogue::with_capacity(catalogue.len());
        for (key, flag) in catalogue.iter() {
            let active = if !flag.active || flag.segments.is_empty() {
                flag.active
            } else {
                self.eval_segments(flag, ctx)
            };
            let selected_version = self.selector.select(flag, ctx);
            debug!(
                "Flag '{key}' resolved: active={active}, version={}",
                selected_version
                    .as_ref()
                    .map(|v| v.name.as_str())
                    .unwrap_or("<none>")
            );
            resolved.insert(
                key.clone(),
                Flag {
                    active,
                    selected_version,
                    ..flag.clone()
                },
            );
        }
        resolved
    }

    fn eval_segments(&self, flag: &Flag, ctx: &UserContext) -> bool {
        flag.segments
            .iter()
            .any(|segment| self.eval_segment(&flag.name, segment, ctx))
    }

    fn eval_segment(&self, flag_name: &str, segment: &Segment, ctx: &UserContext) -> bool {
        let rollout_value = ctx.attribute(&segment.rollout_attribute);
        if self.distributor.distribute(flag_name, rollout_value) > segment.rollout_percentage {
            return false;
        }
        segment
            .string_rules
            .iter()
            .all(|rule| eval_string_rule(rule, ctx))
            && segment
                .number_rules
                .iter()
                .all(|rule| eval_number_rule(rule, ctx))
    }
}

#[cfg(test)]
mod segmentation_tests {
    use crate::eval::segmentation::SegmentationService;
    use crate::eval::selector::VersionSelector;
    use crate::{
        AttributeValue, BucketDistributor, Flag, FlagCatalogue, MurmurBucketDistributor,
        NumberOperator, NumberRule, Segment, StringOperator, StringRule, UserContext, Version,
        IP_ADDRESS, USER_ID,
    };
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    const ACTIVE_FEATURE: &str = "Active Feature";

    struct SequenceBucket {
        buckets: Mutex<VecDeque<u32>>,
    }

    impl SequenceBucket {
        fn new(buckets: &[u32]) -> Self {
            Self {
                buckets: Mutex::new(buckets.iter().copied().collect()),
            }
        }
    }

    impl BucketDistributor for SequenceBucket {
        fn distribute(&self, _: &str, _: Option<&AttributeValue>) -> u32 {
            self.buckets
                .lock()
                .unwrap()
                .pop_front()
                .expect("bucket sequence exhausted")
        }
    }

    fn service() -> SegmentationService {
        SegmentationService::default()
    }

    fn service_with_rollout_buckets(buckets: &[u32]) -> SegmentationService {
        SegmentationService::new(
            Arc::new(SequenceBucket::new(buckets)),
            VersionSelector::new(Arc::new(MurmurBucketDistributor::new())),
        )
    }

    fn string_rule(attribute: &str, operator: StringOperator, value: &str) -> StringRule {
        StringRule {
            attribute: attribute.to_owned(),
            operator,
            value: value.to_owned(),
        }
    }

    fn segment(rollout_percentage: u32, string_rules: Vec<StringRule>) -> Segment {
        Segment {
            rollout_attribute: USER_ID.to_owned(),
            rollout_percentage,
            string_rules,
            number_rules: vec![],
        }
    }

    fn catalogue(active: bool, segments: Vec<Segment>) -> FlagCatalogue {
        let flag = Flag {
            name: ACTIVE_FEATURE.to_owned(),
            active,
            distribution_attribute: USER_ID.to_owned(),
            segments,
            versions: vec![],
            selected_version: None,
        };
        FlagCatalogue::from([(flag.name.clone(), flag)])
    }

    fn user_id_segment(rollout_percentage: u32) -> Segment {
        segment(
            rollout_percentage,
            vec![string_rule(USER_ID, StringOperator::Equals, "12345")],
        )
    }

    fn ip_segment() -> Segment {
        segment(
            100,
            vec![string_rule(IP_ADDRESS, StringOperator::Equals, "127.0.0.1")],
        )
    }

    fn is_active(service: &SegmentationService, catalogue: &FlagCatalogue, ctx: UserContext) -> bool {
        service.execute(catalogue, &ctx)[ACTIVE_FEATURE].active
    }

    #[test]
    fn empty_catalogue() {
        let resolved = service().execute(&FlagCatalogue::new(), &UserContext::new());
        assert!(resolved.is_empty());
    }

    #[test]
    fn unsegmented_flag_is_unchanged() {
        let flags = catalogue(false, vec![]);
        let resolved = service().execute(&flags, &UserContext::new());
        assert_eq!(resolved, flags);
    }

    #[test]
    fn active_without_segments_is_active_for_everyone() {
        let flags = catalogue(true, vec![]);
        assert!(is_active(&service(), &flags, UserContext::new()));
        assert!(is_active(&service(), &flags, UserContext::new().user_id("x")));
    }

    #[test]
    fn inactive_stays_inactive() {
        let flags = catalogue(false, vec![user_id_segment(100), segment(100, vec![])]);
        assert!(!is_active(&service(), &flags, UserContext::new().user_id("12345")));
        assert!(!is_active(&service(), &flags, UserContext::new()));
    }

    #[test]
    fn no_segment_matches() {
        let flags = catalogue(true, vec![user_id_segment(100)]);
        assert!(!is_active(&service(), &flags, UserContext::new().user_id("1111")));
    }

    #[test]
    fn segment_matches() {
        let flags = catalogue(true, vec![user_id_segment(100)]);
        assert!(is_active(&service(), &flags, UserContext::new().user_id("12345")));
    }

    #[test]
    fn custom_attribute_rules() {
        let flags = catalogue(
            true,
            vec![segment(
                100,
                vec![string_rule("email", StringOperator::EndsWith, "@featurit.com")],
            )],
        );

        let other = UserContext::new().custom("email", "featurit.tech@gmail.com");
        let matching = UserContext::new().custom("email", "info@featurit.com");

        assert!(!is_active(&service(), &flags, other));
        assert!(is_active(&service(), &flags, matching));
        assert!(!is_active(&service(), &flags, UserContext::new()));
    }

    #[test]
    fn all_rules_of_a_segment_must_pass() {
        let flags = catalogue(
            true,
            vec![segment(
                100,
                vec![
                    string_rule(USER_ID, StringOperator::Equals, "12345"),
                    string_rule(IP_ADDRESS, StringOperator::Equals, "127.0.0.1"),
                ],
            )],
        );

        assert!(!is_active(&service(), &flags, UserContext::new().user_id("12345")));
        assert!(!is_active(&service(), &flags, UserContext::new().ip_address("127.0.0.1")));
        assert!(is_active(
            &service(),
            &flags,
            UserContext::new().user_id("12345").ip_address("127.0.0.1")
        ));
    }

    #[test]
    fn number_rules_join_the_and() {
        let mut adult = segment(100, vec![string_rule(USER_ID, StringOperator::Equals, "12345")]);
        adult.number_rules.push(NumberRule {
            attribute: "age".to_owned(),
            operator: NumberOperator::GreaterEqualThan,
            value: 18.0,
        });
        let flags = catalogue(true, vec![adult]);

        let minor = UserContext::new().user_id("12345").custom("age", 17);
        let grown = UserContext::new().user_id("12345").custom("age", 18);

        assert!(!is_active(&service(), &flags, minor));
        assert!(is_active(&service(), &flags, grown));
        assert!(!is_active(&service(), &flags, UserContext::new().user_id("12345")));
    }

    #[test]
    fn any_segment_may_match() {
        let flags = catalogue(true, vec![user_id_segment(100), ip_segment()]);

        assert!(is_active(&service(), &flags, UserContext::new().user_id("12345")));
        assert!(is_active(&service(), &flags, UserContext::new().ip_address("127.0.0.1")));
        assert!(is_active(
            &service(),
            &flags,
            UserContext::new().user_id("12345").ip_address("127.0.0.1")
        ));
        assert!(!is_active(
            &service(),
            &flags,
            UserContext::new().user_id("11111").ip_address("192.168.1.1")
        ));
    }

    #[test]
    fn unknown_operator_fails_closed() {
        let flags = catalogue(
            true,
            vec![segment(100, vec![string_rule(USER_ID, "LIKE".into(), "12345")])],
        );
        assert!(!is_active(&service(), &flags, UserContext::new().user_id("12345")));
    }

    #[test]
    fn bucket_above_rollout_percentage() {
        let flags = catalogue(true, vec![user_id_segment(50)]);
        let service = service_with_rollout_buckets(&[100]);
        assert!(!is_active(&service, &flags, UserContext::new().user_id("12345")));
    }

    #[test]
    fn bucket_within_rollout_percentage() {
        let flags = catalogue(true, vec![user_id_segment(50)]);
        let service = service_with_rollout_buckets(&[1, 50]);
        assert!(is_active(&service, &flags, UserContext::new().user_id("12345")));
        assert!(is_active(&service, &flags, UserContext::new().user_id("12345")));
    }

    #[test]
    fn rollout_gate_alone_activates() {
        let flags = catalogue(true, vec![segment(50, vec![])]);
        let service = service_with_rollout_buckets(&[50, 51]);
        assert!(is_active(&service, &flags, UserContext::new()));
        assert!(!is_active(&service, &flags, UserContext::new()));
    }

    #[test]
    fn zero_rollout_never_passes() {
        let flags = catalogue(true, vec![segment(0, vec![])]);
        for id in ["a", "b", "c", "d", "e"] {
            assert!(!is_active(&service(), &flags, UserContext::new().user_id(id)));
        }
    }

    #[test]
    fn version_is_selected_even_for_inactive_flags() {
        let mut flags = catalogue(false, vec![user_id_segment(100)]);
        flags.get_mut(ACTIVE_FEATURE).unwrap().versions = vec![Version {
            name: "v1".to_owned(),
            distribution_percentage: 100,
        }];

        let resolved = service().execute(&flags, &UserContext::new().user_id("1"));
        let flag = &resolved[ACTIVE_FEATURE];

        assert!(!flag.active);
        assert_eq!(flag.selected_version.as_ref().unwrap().name, "v1");
        // inputs stay untouched
        assert!(flags[ACTIVE_FEATURE].selected_version.is_none());
    }
}

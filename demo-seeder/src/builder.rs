//! Hierarchy builder
//!
//! Walks a [`Hierarchy`] in parent-before-child order, creating each node
//! through an [`EntityCreator`] and threading created identities into the
//! relation lists of dependents. A failed node never stops the run: its
//! dependents are still attempted, without the parent link.
//!
//! Requests are issued strictly one at a time since later relation lists
//! depend on identities returned by earlier calls.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::creator::{CreateRequest, CreationOutcome, EntityCreator};
use crate::hierarchy::Hierarchy;
use crate::types::{HierarchyNode, NodeState, Relation, WorkItem};

/// Receives progress notifications while a build runs.
pub trait BuildObserver {
    /// Called right before `node` is sent, with the relations it will carry.
    fn on_attempt(&mut self, _node: &HierarchyNode, _relations: &[Relation]) {}

    /// Called once the node has reached a terminal state.
    fn on_outcome(&mut self, _report: &NodeReport) {}
}

impl BuildObserver for () {}

/// Final record of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeReport {
    pub key: String,
    /// The definition, with `identity` filled in when created.
    pub item: WorkItem,
    pub parent: Option<String>,
    /// Relations sent with the creation request.
    pub relations: Vec<Relation>,
    /// Relations sent but not present on the stored item.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_relations: Vec<Relation>,
    pub state: NodeState,
}

impl NodeReport {
    pub fn identity(&self) -> Option<u64> {
        self.state.identity()
    }

    /// The node declares a parent but was sent without a link to it.
    pub fn parent_unavailable(&self) -> bool {
        self.parent.is_some() && self.relations.is_empty()
    }

    pub fn is_degraded(&self) -> bool {
        self.state.is_created() && !self.missing_relations.is_empty()
    }
}

/// Outcome of a full build, in processing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    pub nodes: Vec<NodeReport>,
}

impl BuildReport {
    pub fn get(&self, key: &str) -> Option<&NodeReport> {
        self.nodes.iter().find(|n| n.key == key)
    }

    pub fn identity(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(NodeReport::identity)
    }

    /// Every node's key with its identity, or `None` when it was not created.
    pub fn summary(&self) -> Vec<(&str, Option<u64>)> {
        self.nodes
            .iter()
            .map(|n| (n.key.as_str(), n.identity()))
            .collect()
    }

    /// Identities of created nodes only.
    pub fn created_ids(&self) -> HashMap<&str, u64> {
        self.nodes
            .iter()
            .filter_map(|n| n.identity().map(|id| (n.key.as_str(), id)))
            .collect()
    }

    pub fn created_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.state.is_created()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.state.failure_reason().is_some())
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &NodeReport> {
        self.nodes
            .iter()
            .filter(|n| n.state.failure_reason().is_some())
    }

    pub fn degraded(&self) -> impl Iterator<Item = &NodeReport> {
        self.nodes.iter().filter(|n| n.is_degraded())
    }
}

/// Creates every node of a hierarchy through one creator.
pub struct HierarchyBuilder<'a, C: EntityCreator + ?Sized> {
    creator: &'a C,
    hierarchy: &'a Hierarchy,
}

impl<'a, C: EntityCreator + ?Sized> HierarchyBuilder<'a, C> {
    pub fn new(creator: &'a C, hierarchy: &'a Hierarchy) -> Self {
        Self { creator, hierarchy }
    }

    /// Attempt every node exactly once and report what happened.
    ///
    /// Each call creates a fresh set of entities; nothing is deduplicated
    /// against earlier runs.
    pub async fn build(&self, observer: &mut dyn BuildObserver) -> BuildReport {
        let mut states: HashMap<&str, NodeState> = self
            .hierarchy
            .ordered()
            .map(|n| (n.key.as_str(), NodeState::Pending))
            .collect();
        let mut reports = Vec::with_capacity(self.hierarchy.len());

        for node in self.hierarchy.ordered() {
            let parent_identity = node.parent.as_deref().and_then(|parent| {
                let state = states.get(parent);
                debug_assert!(
                    state.is_some_and(NodeState::is_terminal),
                    "parent {parent} of {} not terminal",
                    node.key
                );
                state.and_then(NodeState::identity)
            });

            if let (Some(parent), None) = (node.parent.as_deref(), parent_identity) {
                info!(node = %node.key, parent, "Parent unavailable, creating without parent link");
            }

            let relations = node.relations_for(parent_identity);
            observer.on_attempt(node, &relations);
            debug!(node = %node.key, relations = relations.len(), "Attempting creation");

            let request = CreateRequest::for_item(&node.item, relations.clone());
            let mut item = node.item.clone();
            let (state, missing_relations) = match self.creator.create(&request).await {
                CreationOutcome::Created {
                    id,
                    missing_relations,
                } => {
                    item.identity = Some(id);
                    if !missing_relations.is_empty() {
                        warn!(
                            node = %node.key,
                            id,
                            missing = missing_relations.len(),
                            "Created with degraded relations"
                        );
                    }
                    (NodeState::Created(id), missing_relations)
                }
                CreationOutcome::Failed(reason) => {
                    warn!(node = %node.key, "Creation failed: {reason}");
                    (NodeState::Failed(reason), Vec::new())
                }
            };

            states.insert(node.key.as_str(), state.clone());

            let report = NodeReport {
                key: node.key.clone(),
                item,
                parent: node.parent.clone(),
                relations,
                missing_relations,
                state,
            };
            observer.on_outcome(&report);
            reports.push(report);
        }

        BuildReport { nodes: reports }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::demo_graph::demo_graph;
    use crate::types::{RelationKind, SeederConfig, WorkItemType};

    /// In-memory backend: hands out sequential ids and fails chosen titles.
    #[derive(Default)]
    struct FakeCreator {
        requests: Mutex<Vec<CreateRequest>>,
        next_id: Mutex<u64>,
        fail_titles: HashSet<String>,
        drop_relations_for: Option<WorkItemType>,
    }

    impl FakeCreator {
        fn failing(titles: &[&str]) -> Self {
            Self {
                fail_titles: titles.iter().map(|t| t.to_string()).collect(),
                ..Self::default()
            }
        }

        fn requests(&self) -> Vec<CreateRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn request_for(&self, title: &str) -> CreateRequest {
            self.requests()
                .into_iter()
                .find(|r| r.title == title)
                .unwrap_or_else(|| panic!("no request for {title}"))
        }
    }

    #[async_trait]
    impl EntityCreator for FakeCreator {
        async fn create(&self, request: &CreateRequest) -> CreationOutcome {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail_titles.contains(&request.title) {
                return CreationOutcome::Failed("HTTP 500: Internal Server Error".to_string());
            }
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            let missing_relations = if self.drop_relations_for == Some(request.work_item_type) {
                request.relations.clone()
            } else {
                Vec::new()
            };
            CreationOutcome::Created {
                id: 1000 + *next,
                missing_relations,
            }
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Vec<String>,
    }

    impl BuildObserver for RecordingObserver {
        fn on_attempt(&mut self, node: &HierarchyNode, _relations: &[Relation]) {
            self.events.push(format!("attempt:{}", node.key));
        }

        fn on_outcome(&mut self, report: &NodeReport) {
            self.events.push(format!("done:{}", report.key));
        }
    }

    fn demo_hierarchy() -> Hierarchy {
        Hierarchy::new(demo_graph(&SeederConfig::default())).unwrap()
    }

    async fn run(creator: &FakeCreator, hierarchy: &Hierarchy) -> BuildReport {
        HierarchyBuilder::new(creator, hierarchy).build(&mut ()).await
    }

    #[tokio::test]
    async fn test_all_succeed_wires_relations() {
        let hierarchy = demo_hierarchy();
        let creator = FakeCreator::default();
        let report = run(&creator, &hierarchy).await;

        assert_eq!(report.created_count(), 11);
        assert_eq!(report.failed_count(), 0);

        let feature1 = report.identity("feature1").unwrap();
        let pbi1 = report.identity("pbi1").unwrap();

        let login = creator.request_for("Login Screen Implementation");
        assert_eq!(login.relations, vec![Relation::parent_of(feature1)]);
        assert_eq!(
            creator
                .request_for("User Authentication & Authorization")
                .relations,
            vec![Relation::parent_of(report.identity("epic1").unwrap())]
        );

        for task in ["Design Login UI", "Implement PAT Authentication"] {
            assert_eq!(
                creator.request_for(task).relations,
                vec![Relation::parent_of(pbi1)]
            );
        }
    }

    #[tokio::test]
    async fn test_test_case_and_bug_link_same_backlog_item() {
        let hierarchy = demo_hierarchy();
        let creator = FakeCreator::default();
        let report = run(&creator, &hierarchy).await;
        let pbi1 = report.identity("pbi1").unwrap();

        let test_relations = &report.get("test1").unwrap().relations;
        let bug_relations = &report.get("bug1").unwrap().relations;
        assert_eq!(test_relations, &vec![Relation::tested_by(pbi1)]);
        assert_eq!(bug_relations, &vec![Relation::related(pbi1)]);
        assert_ne!(
            report.identity("test1"),
            report.identity("bug1"),
            "both items exist independently"
        );
    }

    #[tokio::test]
    async fn test_failed_epic_still_creates_features_without_relations() {
        let hierarchy = demo_hierarchy();
        let creator = FakeCreator::failing(&["Mobile Application Development Platform"]);
        let report = run(&creator, &hierarchy).await;

        let epic1 = report.get("epic1").unwrap();
        assert!(matches!(epic1.state, NodeState::Failed(ref r) if r.contains("500")));
        assert!(epic1.item.identity.is_none());

        for key in ["feature1", "feature2"] {
            let feature = report.get(key).unwrap();
            assert!(feature.state.is_created());
            assert!(feature.relations.is_empty());
            assert!(feature.parent_unavailable());
        }

        let summary = report.summary();
        assert_eq!(summary[0], ("epic1", None));
        assert!(summary.contains(&("feature1", report.identity("feature1"))));
        assert!(report.identity("feature1").is_some());
        assert!(report.identity("feature2").is_some());

        // Unaffected branch keeps its link; grandchildren keep theirs too
        let epic2 = report.identity("epic2").unwrap();
        assert_eq!(
            report.get("feature3").unwrap().relations,
            vec![Relation::parent_of(epic2)]
        );
        let feature1 = report.identity("feature1").unwrap();
        assert_eq!(
            report.get("pbi1").unwrap().relations,
            vec![Relation::parent_of(feature1)]
        );
    }

    #[tokio::test]
    async fn test_failed_backlog_item_children_are_still_attempted() {
        let hierarchy = demo_hierarchy();
        let creator = FakeCreator::failing(&["Login Screen Implementation"]);
        let report = run(&creator, &hierarchy).await;

        for key in ["task1", "task2", "test1", "bug1"] {
            let child = report.get(key).unwrap();
            assert!(child.state.is_created(), "{key} should be created");
            assert!(child.relations.is_empty(), "{key} must not reference pbi1");
        }
        assert_eq!(creator.requests().len(), 11);
    }

    #[tokio::test]
    async fn test_each_node_attempted_once_after_ancestors() {
        let hierarchy = demo_hierarchy();
        let creator = FakeCreator::failing(&["CI/CD Pipeline Implementation", "Work Item List View"]);
        let report = run(&creator, &hierarchy).await;

        let titles: Vec<String> = creator.requests().into_iter().map(|r| r.title).collect();
        assert_eq!(titles.len(), hierarchy.len());
        let unique: HashSet<&String> = titles.iter().collect();
        assert_eq!(unique.len(), titles.len());

        let position = |key: &str| {
            let title = &hierarchy.get(key).unwrap().item.title;
            titles.iter().position(|t| t == title).unwrap()
        };
        for node in hierarchy.ordered() {
            for ancestor in hierarchy.ancestors(&node.key) {
                assert!(position(ancestor) < position(&node.key));
            }
        }
        assert_eq!(report.nodes.len(), hierarchy.len());
    }

    #[tokio::test]
    async fn test_summary_has_no_placeholder_identities() {
        let hierarchy = demo_hierarchy();
        let creator = FakeCreator::failing(&[
            "Mobile Application Development Platform",
            "Design Login UI",
        ]);
        let report = run(&creator, &hierarchy).await;

        let created = report.created_ids();
        assert_eq!(created.len(), report.created_count());
        assert_eq!(created.len(), 9);
        assert!(!created.contains_key("epic1"));
        assert!(!created.contains_key("task1"));

        let absent: Vec<&str> = report
            .summary()
            .into_iter()
            .filter(|(_, id)| id.is_none())
            .map(|(key, _)| key)
            .collect();
        assert_eq!(absent, vec!["epic1", "task1"]);
        assert_eq!(report.failed().count(), 2);
    }

    #[tokio::test]
    async fn test_all_failures_never_halt_the_run() {
        let hierarchy = demo_hierarchy();
        let titles: Vec<String> = hierarchy.ordered().map(|n| n.item.title.clone()).collect();
        let title_refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        let creator = FakeCreator::failing(&title_refs);

        let report = run(&creator, &hierarchy).await;
        assert_eq!(creator.requests().len(), 11);
        assert_eq!(report.failed_count(), 11);
        assert!(report.created_ids().is_empty());
        assert!(creator.requests().iter().all(|r| r.relations.is_empty()));
    }

    #[tokio::test]
    async fn test_rerun_creates_disjoint_entities() {
        let hierarchy = demo_hierarchy();
        let creator = FakeCreator::default();
        let builder = HierarchyBuilder::new(&creator, &hierarchy);

        let first = builder.build(&mut ()).await;
        let second = builder.build(&mut ()).await;

        let first_ids: HashSet<u64> = first.created_ids().into_values().collect();
        let second_ids: HashSet<u64> = second.created_ids().into_values().collect();
        assert_eq!(first_ids.len(), 11);
        assert_eq!(second_ids.len(), 11);
        assert!(first_ids.is_disjoint(&second_ids));
        assert_eq!(creator.requests().len(), 22);

        // Second run links to its own parents, never the first run's
        let pbi1 = second.identity("pbi1").unwrap();
        assert_eq!(
            second.get("task1").unwrap().relations,
            vec![Relation::parent_of(pbi1)]
        );
    }

    #[tokio::test]
    async fn test_degraded_relations_count_as_created() {
        let hierarchy = demo_hierarchy();
        let creator = FakeCreator {
            drop_relations_for: Some(WorkItemType::TestCase),
            ..FakeCreator::default()
        };
        let report = run(&creator, &hierarchy).await;

        let test1 = report.get("test1").unwrap();
        assert!(test1.state.is_created());
        assert_eq!(test1.missing_relations, test1.relations);
        assert_eq!(test1.missing_relations[0].kind, RelationKind::TestedBy);

        let degraded: Vec<&str> = report.degraded().map(|n| n.key.as_str()).collect();
        assert_eq!(degraded, vec!["test1"]);
        assert_eq!(report.created_count(), 11);
    }

    #[tokio::test]
    async fn test_observer_sees_attempt_then_outcome() {
        let hierarchy = demo_hierarchy();
        let creator = FakeCreator::default();
        let mut observer = RecordingObserver::default();
        HierarchyBuilder::new(&creator, &hierarchy)
            .build(&mut observer)
            .await;

        assert_eq!(observer.events.len(), 22);
        assert_eq!(observer.events[0], "attempt:epic1");
        assert_eq!(observer.events[1], "done:epic1");
        assert_eq!(observer.events[21], "done:bug1");
    }

    #[tokio::test]
    async fn test_report_serializes_states() {
        let hierarchy = demo_hierarchy();
        let creator = FakeCreator::failing(&["Mobile Application Development Platform"]);
        let report = run(&creator, &hierarchy).await;

        let json = serde_json::to_value(&report).unwrap();
        let first = &json["nodes"][0];
        assert_eq!(first["key"], "epic1");
        assert!(first["state"]["failed"].as_str().unwrap().contains("500"));
        assert_eq!(json["nodes"][1]["state"]["created"], 1001);
    }

    // -- End to end against a simulated backend --

    mod http {
        use super::*;
        use std::sync::atomic::{AtomicU64, Ordering};

        use serde_json::{json, Value};
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

        use crate::azure_devops::AzureDevOpsClient;

        /// Assigns sequential ids and echoes the requested relations.
        struct EchoResponder {
            next_id: AtomicU64,
        }

        impl Respond for EchoResponder {
            fn respond(&self, request: &Request) -> ResponseTemplate {
                let document: Vec<Value> = serde_json::from_slice(&request.body).unwrap_or_default();
                let relations: Vec<Value> = document
                    .iter()
                    .filter(|op| op["path"] == "/relations/-")
                    .map(|op| op["value"].clone())
                    .collect();
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                ResponseTemplate::new(200).set_body_json(json!({ "id": id, "relations": relations }))
            }
        }

        fn body_contains(needle: &'static str) -> impl Fn(&Request) -> bool {
            move |request: &Request| String::from_utf8_lossy(&request.body).contains(needle)
        }

        #[tokio::test]
        async fn test_epic_server_error_degrades_gracefully() {
            let server = MockServer::start().await;

            Mock::given(method("PATCH"))
                .and(body_contains("Mobile Application Development Platform"))
                .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                    "message": "VS402625: simulated outage"
                })))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("PATCH"))
                .respond_with(EchoResponder {
                    next_id: AtomicU64::new(200),
                })
                .expect(10)
                .mount(&server)
                .await;

            let config = SeederConfig {
                organization: "contoso".to_string(),
                project: "Demo".to_string(),
                base_url: server.uri(),
                ..SeederConfig::default()
            };
            let client = AzureDevOpsClient::new(config.clone(), "token").unwrap();
            let hierarchy = Hierarchy::new(demo_graph(&config)).unwrap();
            let report = HierarchyBuilder::new(&client, &hierarchy)
                .build(&mut ())
                .await;

            let summary = report.summary();
            assert_eq!(summary[0], ("epic1", None));
            assert!(matches!(
                report.get("epic1").unwrap().state,
                NodeState::Failed(ref r) if r.contains("VS402625")
            ));
            assert!(report.identity("feature1").is_some());
            assert!(report.identity("feature2").is_some());
            assert!(report.get("feature1").unwrap().relations.is_empty());
            assert!(report.get("feature2").unwrap().relations.is_empty());
            assert_eq!(report.created_count(), 10);
            assert_eq!(report.degraded().count(), 0);
        }
    }
}

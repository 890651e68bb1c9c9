//! Recursive comparison of signature trees.

use std::collections::{BTreeMap, BTreeSet};

use crate::differ::report::ErrorReport;
use crate::types::{AttributeSignature, FunctionSignature, NodeSignature, Signature};

/// Compare `candidate` (freshly built) against `baseline` (stored).
///
/// Returns `None` when the trees are structurally equal. Names of the two
/// roots are not compared; only kinds and contents are.
pub fn validate(candidate: &Signature, baseline: &Signature) -> Option<ErrorReport> {
    match (candidate, baseline) {
        (Signature::Module(cand), Signature::Module(base))
        | (Signature::Class(cand), Signature::Class(base)) => validate_node(cand, base),
        (Signature::Function(cand), Signature::Function(base)) => validate_function(cand, base),
        (Signature::Attribute(cand), Signature::Attribute(base)) => validate_attribute(cand, base),
        (Signature::Generator(_), Signature::Generator(_)) => None,
        _ => Some(ErrorReport::KindMismatch {
            baseline: baseline.kind(),
            candidate: candidate.kind(),
        }),
    }
}

/// Structural equality as defined by [`validate`].
pub fn structurally_equal(a: &Signature, b: &Signature) -> bool {
    validate(a, b).is_none()
}

fn validate_node(candidate: &NodeSignature, baseline: &NodeSignature) -> Option<ErrorReport> {
    if candidate.recursive != baseline.recursive {
        return Some(ErrorReport::RecursionChanged {
            baseline: baseline.recursive,
            candidate: candidate.recursive,
        });
    }

    let base_keys: BTreeSet<&str> = baseline.children.keys().map(String::as_str).collect();
    let cand_keys: BTreeSet<&str> = candidate.children.keys().map(String::as_str).collect();

    let mut members = BTreeMap::new();

    // Missing members (present in the baseline, gone now)
    for name in base_keys.difference(&cand_keys) {
        members.insert((*name).to_string(), ErrorReport::MissingElement);
    }

    // Unknown members (newly introduced)
    for name in cand_keys.difference(&base_keys) {
        members.insert((*name).to_string(), ErrorReport::UnknownElement);
    }

    // Members present on both sides
    for name in base_keys.intersection(&cand_keys) {
        if let Some(err) = validate(&candidate.children[*name], &baseline.children[*name]) {
            members.insert((*name).to_string(), err);
        }
    }

    if members.is_empty() {
        None
    } else {
        Some(ErrorReport::Members { members })
    }
}

fn validate_function(
    candidate: &FunctionSignature,
    baseline: &FunctionSignature,
) -> Option<ErrorReport> {
    let mut details = Vec::new();

    if candidate.is_opaque != baseline.is_opaque {
        details.push(format!(
            "opaque: {} -> {}",
            baseline.is_opaque, candidate.is_opaque
        ));
    }
    if candidate.parameters != baseline.parameters {
        details.push(format!(
            "parameters: ({}) -> ({})",
            baseline.parameters.join(", "),
            candidate.parameters.join(", ")
        ));
    }
    if candidate.variadic_positional != baseline.variadic_positional {
        details.push(format!(
            "varargs: {} -> {}",
            baseline.variadic_positional.as_deref().unwrap_or("none"),
            candidate.variadic_positional.as_deref().unwrap_or("none")
        ));
    }
    if candidate.variadic_keyword != baseline.variadic_keyword {
        details.push(format!(
            "varkw: {} -> {}",
            baseline.variadic_keyword.as_deref().unwrap_or("none"),
            candidate.variadic_keyword.as_deref().unwrap_or("none")
        ));
    }
    if candidate.keyword_only != baseline.keyword_only {
        details.push(format!(
            "keyword-only: ({}) -> ({})",
            baseline.keyword_only.join(", "),
            candidate.keyword_only.join(", ")
        ));
    }
    if !sequences_equal(&candidate.defaults, &baseline.defaults) {
        details.push(format!(
            "defaults: ({}) -> ({})",
            labels(baseline.defaults.iter()),
            labels(candidate.defaults.iter())
        ));
    }
    if !maps_equal(&candidate.keyword_only_defaults, &baseline.keyword_only_defaults) {
        details.push(format!(
            "keyword-only defaults: {{{}}} -> {{{}}}",
            keyed_labels(&baseline.keyword_only_defaults),
            keyed_labels(&candidate.keyword_only_defaults)
        ));
    }
    if !maps_equal(&candidate.annotations, &baseline.annotations) {
        details.push(format!(
            "annotations: {{{}}} -> {{{}}}",
            keyed_labels(&baseline.annotations),
            keyed_labels(&candidate.annotations)
        ));
        // Per-parameter breakdown of what changed inside each annotation.
        for (param, base_ann) in &baseline.annotations {
            let Some(cand_ann) = candidate.annotations.get(param) else {
                continue;
            };
            if let Some(nested) = validate(cand_ann, base_ann) {
                details.push(format!("annotation {}: {}", param, nested_summary(&nested)));
            }
        }
    }

    if details.is_empty() {
        None
    } else {
        Some(ErrorReport::FunctionChanged {
            baseline: baseline.render(),
            candidate: candidate.render(),
            details,
        })
    }
}

fn validate_attribute(
    candidate: &AttributeSignature,
    baseline: &AttributeSignature,
) -> Option<ErrorReport> {
    if candidate.type_name == baseline.type_name {
        None
    } else {
        Some(ErrorReport::AttributeChanged {
            baseline: baseline.type_name.clone(),
            candidate: candidate.type_name.clone(),
        })
    }
}

fn sequences_equal(a: &[Signature], b: &[Signature]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| structurally_equal(x, y))
}

fn maps_equal(a: &BTreeMap<String, Signature>, b: &BTreeMap<String, Signature>) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(key, x)| b.get(key).is_some_and(|y| structurally_equal(x, y)))
}

fn labels<'a>(sigs: impl Iterator<Item = &'a Signature>) -> String {
    sigs.map(Signature::label).collect::<Vec<_>>().join(", ")
}

fn nested_summary(report: &ErrorReport) -> String {
    report
        .entries()
        .into_iter()
        .map(|entry| {
            if entry.path.is_empty() {
                entry.description
            } else {
                format!("{} {}", entry.path, entry.description)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn keyed_labels(map: &BTreeMap<String, Signature>) -> String {
    map.iter()
        .map(|(key, sig)| format!("{}: {}", key, sig.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GeneratorSignature, SignatureKind};

    fn attr(name: &str, ty: &str) -> Signature {
        Signature::Attribute(AttributeSignature::new(name, ty))
    }

    fn module(name: &str, children: Vec<(&str, Signature)>) -> Signature {
        let node = children
            .into_iter()
            .fold(NodeSignature::new(name), |node, (key, child)| {
                node.with_child(key, child)
            });
        Signature::Module(node)
    }

    fn function(name: &str, params: &[&str], defaults: Vec<Signature>) -> Signature {
        let mut func = FunctionSignature::new(name);
        func.parameters = params.iter().map(|p| p.to_string()).collect();
        func.defaults = defaults;
        Signature::Function(func)
    }

    #[test]
    fn test_identical_trees_validate() {
        let tree = module(
            "pkg",
            vec![
                ("VERSION", attr("VERSION", "str")),
                ("run", function("run", &["a", "b"], vec![attr("b", "int")])),
            ],
        );
        assert!(validate(&tree, &tree.clone()).is_none());
    }

    #[test]
    fn test_kind_mismatch_short_circuits() {
        let m = module("pkg", vec![("x", attr("x", "int"))]);
        let c = Signature::Class(NodeSignature::new("pkg"));

        let report = validate(&c, &m).unwrap();
        assert_eq!(
            report,
            ErrorReport::KindMismatch {
                baseline: SignatureKind::Module,
                candidate: SignatureKind::Class,
            }
        );
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_missing_and_unknown_members() {
        let baseline = module("pkg", vec![("old", attr("old", "int"))]);
        let candidate = module("pkg", vec![("new", attr("new", "int"))]);

        let report = validate(&candidate, &baseline).unwrap();
        assert_eq!(report.member("old"), Some(&ErrorReport::MissingElement));
        assert_eq!(report.member("new"), Some(&ErrorReport::UnknownElement));
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn test_nested_changes_are_keyed_by_member() {
        let baseline = module("pkg", vec![("sub", module("sub", vec![("x", attr("x", "int"))]))]);
        let candidate = module("pkg", vec![("sub", module("sub", vec![("x", attr("x", "str"))]))]);

        let report = validate(&candidate, &baseline).unwrap();
        let nested = report.member("sub").and_then(|r| r.member("x"));
        assert_eq!(
            nested,
            Some(&ErrorReport::AttributeChanged {
                baseline: "int".to_string(),
                candidate: "str".to_string(),
            })
        );
    }

    #[test]
    fn test_default_type_drift_is_detected() {
        let baseline = function("f", &["x"], vec![attr("x", "int")]);
        let candidate = function("f", &["x"], vec![attr("x", "str")]);

        match validate(&candidate, &baseline) {
            Some(ErrorReport::FunctionChanged { details, .. }) => {
                assert_eq!(details, vec!["defaults: (int) -> (str)".to_string()]);
            }
            other => panic!("expected function change, got {:?}", other),
        }
    }

    #[test]
    fn test_default_names_do_not_matter() {
        let baseline = function("f", &["x"], vec![attr("x", "int")]);
        let candidate = function("f", &["x"], vec![attr("renamed", "int")]);
        assert!(validate(&candidate, &baseline).is_none());
    }

    #[test]
    fn test_parameter_changes_are_detailed() {
        let baseline = function("f", &["a", "b"], vec![]);
        let candidate = function("f", &["a"], vec![]);

        let report = validate(&candidate, &baseline).unwrap();
        let text = report.to_string();
        assert!(text.contains("parameters: (a, b) -> (a)"));
        assert!(text.contains("f(a, b) -> f(a)"));
    }

    #[test]
    fn test_opaque_flag_mismatch() {
        let baseline = Signature::Function(FunctionSignature::opaque("len"));
        let candidate = function("len", &["obj"], vec![]);
        assert!(validate(&candidate, &baseline).is_some());

        let other_opaque = Signature::Function(FunctionSignature::opaque("len"));
        assert!(validate(&other_opaque, &baseline).is_none());
    }

    #[test]
    fn test_annotation_change() {
        let mut base = FunctionSignature::new("f");
        base.parameters = vec!["x".into()];
        base.annotations.insert("x".into(), attr("x", "int"));
        let mut cand = base.clone();
        cand.annotations.insert("x".into(), attr("x", "float"));

        let report = validate(&Signature::Function(cand), &Signature::Function(base)).unwrap();
        assert!(report.to_string().contains("annotations: {x: int} -> {x: float}"));
    }

    #[test]
    fn test_annotation_class_drift_is_spelled_out() {
        let client = |members: Vec<(&str, Signature)>| {
            let node = members
                .into_iter()
                .fold(NodeSignature::new("Client"), |node, (key, child)| {
                    node.with_child(key, child)
                });
            Signature::Class(node)
        };
        let mut base = FunctionSignature::new("connect");
        base.parameters = vec!["client".into()];
        base.annotations.insert(
            "client".into(),
            client(vec![("send", function("send", &["self"], vec![]))]),
        );
        let mut cand = base.clone();
        cand.annotations.insert(
            "client".into(),
            client(vec![("recv", function("recv", &["self"], vec![]))]),
        );

        let report = validate(&Signature::Function(cand), &Signature::Function(base)).unwrap();
        let ErrorReport::FunctionChanged { details, .. } = &report else {
            panic!("expected a function change, got {:?}", report);
        };
        assert!(details.contains(&"annotations: {client: Client} -> {client: Client}".to_string()));
        assert!(details.contains(
            &"annotation client: recv unknown element; send missing element".to_string()
        ));
    }

    #[test]
    fn test_generators_are_inert() {
        let a = Signature::Generator(GeneratorSignature::new("items"));
        let b = Signature::Generator(GeneratorSignature::new("other"));
        assert!(structurally_equal(&a, &b));
        assert!(!structurally_equal(&a, &attr("items", "generator")));
    }

    #[test]
    fn test_recursion_flag_change() {
        let baseline = Signature::Module(NodeSignature::back_reference("pkg"));
        let candidate = Signature::Module(NodeSignature::new("pkg"));
        assert_eq!(
            validate(&candidate, &baseline),
            Some(ErrorReport::RecursionChanged {
                baseline: true,
                candidate: false,
            })
        );
    }
}

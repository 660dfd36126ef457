//! Mermaid diagram synthesis.
//!
//! The diagrams are best-effort visualizations derived from the syntax tree,
//! not verified control-flow or call graphs.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::syntax::{Node, SyntaxTree};

/// Maximum number of declared sequence participants besides `Main`.
const MAX_PARTICIPANTS: usize = 5;

/// Words the sequence diagram grammar reserves, compared case-insensitively.
const SEQUENCE_KEYWORDS: &[&str] = &[
    "activate", "actor", "alt", "and", "as", "autonumber", "box", "break", "create",
    "critical", "deactivate", "destroy", "details", "else", "end", "left", "link", "links",
    "loop", "note", "of", "opt", "over", "par", "participant", "properties", "rect",
    "right", "title",
];

/// Mermaid id for a callable; reserved words and `Main` get a prefix.
fn participant_id(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    if name == "Main" || SEQUENCE_KEYWORDS.contains(&lower.as_str()) {
        format!("py_{}", name)
    } else {
        name.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramKind {
    Flowchart,
    Sequence,
    Class,
}

impl DiagramKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramKind::Flowchart => "flowchart",
            DiagramKind::Sequence => "sequence",
            DiagramKind::Class => "class",
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagram text keyed by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagramSet(BTreeMap<DiagramKind, String>);

impl DiagramSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: DiagramKind) -> Option<&str> {
        self.0.get(&kind).map(String::as_str)
    }

    pub fn insert(&mut self, kind: DiagramKind, text: String) {
        self.0.insert(kind, text);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DiagramKind, &str)> {
        self.0.iter().map(|(kind, text)| (*kind, text.as_str()))
    }
}

/// Build every diagram for a module; empty when there is no tree.
pub fn synthesize(tree: Option<&SyntaxTree>) -> DiagramSet {
    let mut set = DiagramSet::new();
    let Some(tree) = tree else {
        return set;
    };

    set.insert(DiagramKind::Flowchart, flowchart(tree));
    set.insert(DiagramKind::Sequence, sequence(tree));
    if let Some(class) = class_diagram(tree) {
        set.insert(DiagramKind::Class, class);
    }
    set
}

/// Linear chain over top-level definitions and conditionals.
pub fn flowchart(tree: &SyntaxTree) -> String {
    let mut lines = vec![
        "flowchart TD".to_string(),
        "    Start([Start]) --> Init[Initialize Variables]".to_string(),
    ];

    let mut counter = 0;
    let mut prev = "Init".to_string();
    for node in &tree.body {
        let shape = match node {
            Node::FunctionDef(def) => format!("[Function: {}]", def.name),
            Node::ClassDef(def) => format!("[[Class: {}]]", def.name),
            Node::Conditional(_) => "{Conditional Logic}".to_string(),
            Node::Import(_)
            | Node::Assign(_)
            | Node::Call(_)
            | Node::Literal(_)
            | Node::Name(_)
            | Node::ExceptHandler(_)
            | Node::Other(_) => continue,
        };
        counter += 1;
        let id = format!("N{}", counter);
        lines.push(format!("    {} --> {}{}", prev, id, shape));
        prev = id;
    }

    lines.push(format!("    {} --> End([End])", prev));
    lines.join("\n")
}

/// Calls from a synthetic `Main` actor to every known callable.
pub fn sequence(tree: &SyntaxTree) -> String {
    let mut callables: Vec<&str> = Vec::new();
    for node in tree.walk() {
        if let Node::FunctionDef(def) = node {
            if !callables.contains(&def.name.as_str()) {
                callables.push(&def.name);
            }
        }
    }
    let known: HashSet<&str> = callables.iter().copied().collect();

    let mut lines = vec!["sequenceDiagram".to_string(), "    participant Main".to_string()];
    for name in callables.iter().take(MAX_PARTICIPANTS) {
        let id = participant_id(name);
        if id == *name {
            lines.push(format!("    participant {}", name));
        } else {
            lines.push(format!("    participant {} as {}", id, name));
        }
    }
    lines.push("    Main->>Main: Initialize".to_string());

    for node in tree.walk() {
        let Node::Call(call) = node else {
            continue;
        };
        if let Some(callee) = call.callee_name().filter(|c| known.contains(c)) {
            let id = participant_id(callee);
            lines.push(format!("    Main->>{}: Call {}()", id, callee));
            lines.push(format!("    {}-->>Main: Return", id));
        }
    }

    lines.join("\n")
}

/// One block per class with inheritance arrows; `None` without classes.
pub fn class_diagram(tree: &SyntaxTree) -> Option<String> {
    let mut lines = vec!["classDiagram".to_string()];
    let mut any = false;

    for node in tree.walk() {
        let Node::ClassDef(def) = node else {
            continue;
        };
        any = true;

        let mut attributes = Vec::new();
        let mut methods = Vec::new();
        for item in &def.body {
            match item {
                Node::FunctionDef(method) => methods.push(method.name.as_str()),
                Node::Assign(assign) => attributes.extend(assign.name_targets()),
                _ => {}
            }
        }

        lines.push(format!("    class {} {{", def.name));
        for attr in attributes {
            lines.push(format!("        +{}", attr));
        }
        for method in methods {
            lines.push(format!("        +{}()", method));
        }
        lines.push("    }".to_string());

        for base in &def.bases {
            if let Some(base) = base.expr.as_name() {
                lines.push(format!("    {} <|-- {}", base, def.name));
            }
        }
    }

    any.then(|| lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    #[test]
    fn test_flowchart_chain() {
        let source = "import os\n\ndef main():\n    pass\n\nclass App:\n    pass\n\nif __name__ == '__main__':\n    main()\n";
        let text = flowchart(&parse(source).unwrap());
        let expected = [
            "flowchart TD",
            "    Start([Start]) --> Init[Initialize Variables]",
            "    Init --> N1[Function: main]",
            "    N1 --> N2[[Class: App]]",
            "    N2 --> N3{Conditional Logic}",
            "    N3 --> End([End])",
        ]
        .join("\n");
        assert_eq!(text, expected);
    }

    #[test]
    fn test_empty_module_flowchart() {
        let text = flowchart(&parse("").unwrap());
        assert!(text.ends_with("    Init --> End([End])"));
    }

    #[test]
    fn test_sequence_caps_participants() {
        let mut source = String::new();
        for name in ["a", "b", "c", "d", "e", "f"] {
            source.push_str(&format!("def {}():\n    pass\n", name));
        }
        source.push_str("f()\nprint('x')\n");
        let text = sequence(&parse(&source).unwrap());
        assert_eq!(text.matches("participant ").count(), 1 + MAX_PARTICIPANTS);
        assert!(!text.contains("participant f"));
        assert!(text.contains("    Main->>f: Call f()\n    f-->>Main: Return"));
        assert!(!text.contains("print"));
    }

    #[test]
    fn test_reserved_callable_names_are_aliased() {
        let source = "def end():\n    pass\n\ndef Loop():\n    pass\n\ndef Main():\n    end()\n\ndef main():\n    Main()\n\nmain()\n";
        let text = sequence(&parse(source).unwrap());
        assert!(text.contains("    participant py_end as end\n"));
        assert!(text.contains("    participant py_Loop as Loop\n"));
        assert!(text.contains("    participant py_Main as Main\n"));
        assert!(text.contains("    participant main\n"));
        assert!(text.contains("    Main->>py_end: Call end()\n    py_end-->>Main: Return"));
        assert!(text.contains("    Main->>py_Main: Call Main()\n    py_Main-->>Main: Return"));
        assert!(text.contains("    Main->>main: Call main()"));
        assert!(!text.contains("participant end"));
    }

    #[test]
    fn test_class_diagram() {
        let source = "class Dog(Animal, mixins.Loud):\n    x = 1\n    def bark(self): pass\n";
        let text = class_diagram(&parse(source).unwrap()).unwrap();
        assert_eq!(
            text,
            "classDiagram\n    class Dog {\n        +x\n        +bark()\n    }\n    Animal <|-- Dog"
        );
        assert!(class_diagram(&parse("x = 1\n").unwrap()).is_none());
    }

    #[test]
    fn test_synthesize_without_tree() {
        assert!(synthesize(None).is_empty());
        let set = synthesize(Some(&parse("x = 1\n").unwrap()));
        assert_eq!(set.len(), 2);
        assert!(set.get(DiagramKind::Class).is_none());
    }
}

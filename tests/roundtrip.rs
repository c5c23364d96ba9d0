use serde_json::json;

use woql::term::{doc, iri, literal};
use woql::{compile_path, contains_update, decompile_path, read, render, Vocabulary, WoqlQuery};
use woql::query::{Order, OrderTemplate};

fn corpus() -> Vec<WoqlQuery> {
    vec![
        WoqlQuery::new().triple("v:S", "label", "hello"),
        WoqlQuery::new().quad(iri("doc:Jane"), "scm:age", 42, "instance"),
        WoqlQuery::new().triple("Jane", "type", "label"),
        WoqlQuery::new().triple("v:S", "scm:title", literal("a:b", "xsd:string")),
        WoqlQuery::new()
            .select(["v:S", "v:T"], None)
            .triple("v:S", "rdfs:label", "v:L")
            .path("v:S", "(<hop,hop>)+", "v:T", None),
        WoqlQuery::new().distinct(["v:A"], Some(WoqlQuery::new().star())),
        WoqlQuery::new().limit(10, None).start(5, None).star(),
        WoqlQuery::new().and(vec![
            WoqlQuery::new().or(vec![
                WoqlQuery::new().triple("v:A", "p", "v:B"),
                WoqlQuery::new().triple("v:B", "p", "v:A"),
            ]),
            WoqlQuery::new().not(Some(WoqlQuery::new().triple("v:A", "q", -3))),
            WoqlQuery::new().opt(None).triple("v:A", "r", "v:C"),
        ]),
        WoqlQuery::new()
            .when(WoqlQuery::new().triple("v:A", "p", "v:B"), None)
            .add_triple("v:A", "q", "v:B"),
        WoqlQuery::new().into_graph("instance/main", Some(WoqlQuery::new().delete_quad("v:A", "v:B", "v:C", "instance"))),
        WoqlQuery::new().from_graph("schema", None).added_triple("v:A", "v:B", "v:C"),
        WoqlQuery::new().using("admin/people", Some(WoqlQuery::new().removed_triple("v:A", "v:B", "v:C"))),
        WoqlQuery::new().comment("note \"this\"\n", None).immediately(None).true_(),
        WoqlQuery::new().once(Some(WoqlQuery::new().count("v:N", Some(WoqlQuery::new().star())))),
        WoqlQuery::new()
            .order_by(
                vec![OrderTemplate::from("v:A"), OrderTemplate::new("v:B", Order::Desc)],
                None,
            )
            .group_by("v:A", vec!["v:B", "v:C"], "v:G", Some(WoqlQuery::new().star())),
        WoqlQuery::new().and(vec![
            WoqlQuery::new().isa("v:X", "Person"),
            WoqlQuery::new().sub("scm:Animal", "v:C"),
            WoqlQuery::new().type_of("v:X", "v:T"),
            WoqlQuery::new().typecast("v:A", "xsd:integer", "v:B"),
        ]),
        WoqlQuery::new().and(vec![
            WoqlQuery::new().eq("v:X", literal("2021", "xsd:gYear")),
            WoqlQuery::new().eq("v:Y", literal(true, "xsd:boolean")),
            WoqlQuery::new().eq("v:Z", literal("v:W", "xsd:string")),
            WoqlQuery::new().less("v:A", 10),
            WoqlQuery::new().greater("v:A", 2.5),
            WoqlQuery::new().like("v:A", "abc", "v:Sim"),
        ]),
        WoqlQuery::new().and(vec![
            WoqlQuery::new().concat(vec!["v:A", "-", "v:B"], "v:C"),
            WoqlQuery::new().join(vec!["v:A", "v:B"], ", ", "v:C"),
            WoqlQuery::new().split("a,b", ",", "v:L"),
            WoqlQuery::new().trim("  x ", "v:T"),
            WoqlQuery::new().upper("v:A", "v:U"),
            WoqlQuery::new().lower("v:A", "v:L"),
            WoqlQuery::new().pad("v:S", "0", 4, "v:P"),
            WoqlQuery::new().substr("v:S", 0, 3, "v:After", "v:Sub"),
            WoqlQuery::new().re("^a(.*)$", "v:S", vec!["v:All", "v:Rest"]),
        ]),
        WoqlQuery::new().and(vec![
            WoqlQuery::new().sum(vec![1, 2, 3], "v:Total"),
            WoqlQuery::new().length("v:List", "v:Len"),
            WoqlQuery::new().member("v:M", vec!["a", "v:B"]),
            WoqlQuery::new().dot("v:Doc", "name", "v:Name"),
        ]),
        WoqlQuery::new().eval(
            WoqlQuery::new().plus(
                1,
                WoqlQuery::new().times(WoqlQuery::new().floor("v:X"), WoqlQuery::new().exp(2, "v:N")),
            ),
            "v:Y",
        ),
        WoqlQuery::new().and(vec![
            WoqlQuery::new().eval(WoqlQuery::new().divide("v:A", 3), "v:B"),
            WoqlQuery::new().eval(WoqlQuery::new().div("v:A", 3), "v:C"),
            WoqlQuery::new().eval(WoqlQuery::new().minus("v:A", 0.5), "v:D"),
        ]),
        WoqlQuery::new().path("v:A", "knows{1,3},(likes|.)*", "v:B", Some("v:P".into())),
        WoqlQuery::new().and(vec![
            WoqlQuery::new().triple_count("instance/main", "v:N"),
            WoqlQuery::new().size("instance/main", "v:S"),
        ]),
        WoqlQuery::new().and(vec![
            WoqlQuery::new().read_document(iri("doc:x"), "v:Doc"),
            WoqlQuery::new().insert_document(json!({"@type": "Person", "name": "Jane"}), Some("v:Id".into())),
            WoqlQuery::new().update_document(doc(json!({"@id": "doc:x", "tags": ["a", "b"]})), None),
            WoqlQuery::new().delete_document(iri("doc:y")),
        ]),
        WoqlQuery::new().and(vec![
            WoqlQuery::new().idgen("doc:Person/", vec!["v:Name"], "v:Id"),
            WoqlQuery::new().unique("doc:Hash/", vec!["v:A", "v:B"], "v:H"),
            WoqlQuery::new().random_idgen("doc:Random/", "v:R"),
        ]),
        WoqlQuery::new().and(vec![
            WoqlQuery::new().added_quad("v:A", "v:B", "v:C", "instance"),
            WoqlQuery::new().add_quad(iri("Jane"), "scm:knows", iri("Joe"), "instance"),
            WoqlQuery::new().delete_triple("v:A", "scm:knows", "v:B"),
        ]),
    ]
}

#[test]
fn test_render_then_read() {
    for query in corpus() {
        assert!(!query.has_errors(), "{:?}", query.errors());

        let text = query.render().unwrap();
        let replayed = read(&text).unwrap();

        assert_eq!(replayed.json(), query.json(), "replaying\n{}", text);
        assert_eq!(replayed.contains_update(), query.contains_update(), "{}", text);
        assert!(!replayed.has_errors(), "{}: {:?}", text, replayed.errors());
    }
}

#[test]
fn test_render_is_stable() {
    for query in corpus() {
        let text = query.render().unwrap();
        assert_eq!(read(&text).unwrap().render().unwrap(), text);
    }
}

#[test]
fn test_render_free_function() {
    for query in corpus() {
        assert_eq!(render(&query.json()).unwrap(), query.render().unwrap());
    }
}

#[test]
fn test_simple_triple_scenario() {
    let query = WoqlQuery::new().triple("v:S", "label", "hello");

    assert_eq!(query.json()["subject"]["variable"], json!("S"));
    assert_eq!(query.json()["predicate"]["node"], json!("rdfs:label"));
    assert_eq!(
        query.json()["object"]["data"],
        json!({"@type": "xsd:string", "@value": "hello"})
    );
}

#[test]
fn test_path_scenario() {
    let compiled = compile_path("(<hop,hop>)+").unwrap();

    assert_eq!(
        compiled,
        json!({
            "@type": "PathPlus",
            "plus": {
                "@type": "PathSequence",
                "sequence": [
                    {"@type": "InversePathPredicate", "predicate": "hop"},
                    {"@type": "PathPredicate", "predicate": "hop"},
                ],
            },
        })
    );
    assert_eq!(decompile_path(&compiled).unwrap(), "(<hop,hop)+");
}

#[test]
fn test_path_round_trip() {
    let test_cases = vec![
        "hop",
        ".",
        "<hop",
        "<hop>",
        "a,b,c",
        "a|b|c",
        "(a|b),c",
        "a,(b|c)",
        "(a,b)+",
        "a*",
        "(a|<b>){2,5}",
        "scm:friend_of+,<scm:parent",
    ];

    for pattern in test_cases {
        let tree = compile_path(pattern).unwrap();
        let text = decompile_path(&tree).unwrap();
        assert_eq!(compile_path(&text).unwrap(), tree, "{} -> {}", pattern, text);
    }
}

#[test]
fn test_update_flag_propagation() {
    let test_cases = vec![
        (WoqlQuery::new().and(vec![WoqlQuery::new().star(), WoqlQuery::new().add_triple("a:x", "p", "v:O")]), true),
        (WoqlQuery::new().opt(Some(WoqlQuery::new().delete_document("v:D"))), true),
        (WoqlQuery::new().select(["v:X"], None).insert_document(json!({"a": 1}), None), true),
        (
            WoqlQuery::new().when(WoqlQuery::new().star(), Some(WoqlQuery::new().delete_triple("v:S", "v:P", "v:O"))),
            true,
        ),
        (WoqlQuery::new().select(["v:X"], None).star(), false),
    ];

    for (query, expected) in test_cases {
        assert_eq!(query.contains_update(), expected, "{}", query.json());
        assert_eq!(contains_update(&query.json()), expected);
    }
}

#[test]
fn test_vocabulary_round_trip() {
    let vocab = Vocabulary::new().with_entries([("knows", "scm:knows")]);
    let query = WoqlQuery::with_vocabulary(vocab.clone())
        .triple("v:A", "knows", literal("knows", "xsd:string"));

    let text = query.render().unwrap();
    let replayed = woql::reader::read_with(&text, vocab).unwrap();
    assert_eq!(replayed.json(), query.json());
}

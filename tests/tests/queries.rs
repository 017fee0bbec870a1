//! Ad-hoc statements: guards, row mapping, cardinality and counts.

use pretty_assertions::assert_eq;
use strand_tests::prelude::*;

mod guards {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_keywords_rejected_in_any_case() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);

        for cypher in [
            "CREATE (n:Person) RETURN n",
            "match (n) merge (m:Person {name: 'x'}) return m",
            "MATCH (n) Set n.name = 'x' RETURN n",
            "MATCH (n) DETACH delete n",
            "MATCH (n) REMOVE n.age RETURN n",
        ] {
            let result = session.query(cypher, props!());
            assert!(
                matches!(result, Err(SessionError::ReadOnlyViolation { .. })),
                "{} should be rejected",
                cypher
            );
        }

        assert_eq!(server.request_count(), 0);
    }

    #[test]
    fn test_keywords_inside_identifiers_are_accepted() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);

        let result = session.query(
            "MATCH (n:Dataset {createdAt: $at}) WHERE n.offset > 0 AND n.reset IS NULL RETURN n.name",
            props! { "at" => 3i64 },
        );

        assert!(result.is_ok());
        assert_eq!(server.request_count(), 1);
    }

    #[test]
    fn test_read_only_guard_applies_to_typed_queries() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);

        let result = session.query_for("Person", "CREATE (n:Person) RETURN n", props!());

        assert!(matches!(
            result,
            Err(SessionError::ReadOnlyViolation { keyword }) if keyword == "CREATE"
        ));
        assert_eq!(server.request_count(), 0);
    }

    #[test]
    fn test_blank_statements_rejected() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);

        assert!(matches!(session.query("   ", props!()), Err(SessionError::EmptyStatement)));
        assert!(matches!(session.execute(""), Err(SessionError::EmptyStatement)));
        assert!(matches!(
            session.query_for(" ", "MATCH (n) RETURN n", props!()),
            Err(SessionError::InvalidType)
        ));
        assert_eq!(server.request_count(), 0);
    }

    #[test]
    fn test_execute_rejects_return_clause() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);

        assert!(matches!(
            session.execute("MATCH (n) RETURN n"),
            Err(SessionError::ReturnNotAllowed)
        ));
        assert!(matches!(
            session.execute("match (n) return n.name"),
            Err(SessionError::ReturnNotAllowed)
        ));
        assert_eq!(server.request_count(), 0);
    }

    #[test]
    fn test_execute_accepts_return_inside_identifiers() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);

        let result = session.execute("MATCH (n:Loan) SET n.returnDate = 1");

        assert!(result.is_ok());
        assert_eq!(server.request_count(), 1);
    }

    #[test]
    fn test_named_queries_unsupported() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);

        assert!(matches!(
            session.named_query("peopleByName"),
            Err(SessionError::UnsupportedNamedQuery { name }) if name == "peopleByName"
        ));
        assert_eq!(server.request_count(), 0);
    }
}

mod rows {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_query_maps_rows_by_column() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        server.reply(replies::rows(
            &["name", "born"],
            vec![vec![json!("Ada"), json!(1815)], vec![json!("Bob"), json!(null)]],
        ));

        let rows = session
            .query("MATCH (n:Person) RETURN n.name AS name, n.year_of_birth AS born", props!())
            .unwrap();

        assert_eq!(
            rows,
            vec![
                props! { "name" => "Ada", "born" => 1815i64 },
                props! { "name" => "Bob", "born" => Value::Null },
            ]
        );
        let statement = server.last_statement().unwrap();
        assert_eq!(statement["resultDataContents"], json!(["row"]));
    }

    #[test]
    fn test_query_for_scalar_type_reads_single_column() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        server.reply(replies::rows(&["name"], vec![vec![json!("Ada")], vec![json!("Bob")]]));

        let names = session
            .query_for("String", "MATCH (n:Person) RETURN n.name", props!())
            .unwrap();

        let names: Vec<Value> = names.into_iter().filter_map(QueryItem::into_value).collect();
        assert_eq!(names, vec![Value::from("Ada"), Value::from("Bob")]);
    }

    #[test]
    fn test_query_for_mapped_type_returns_objects() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        server.reply(replies::graph(
            vec![
                replies::node(1, "Person", json!({"name": "Ada"})),
                replies::node(2, "Movie", json!({"title": "Up"})),
            ],
            vec![],
        ));

        let found = session
            .query_for("Person", "MATCH (n:Person) RETURN n", props!())
            .unwrap();

        assert_eq!(found.len(), 1);
        let ada = found[0].as_entity().unwrap();
        assert_eq!(ada.borrow().property("name"), Value::from("Ada"));
        assert_eq!(
            server.last_statement().unwrap()["resultDataContents"],
            json!(["graph"])
        );
    }

    #[test]
    fn test_query_for_object_cardinality() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        let cypher = "MATCH (n:Person) RETURN n.name";

        // no row
        server.reply(replies::rows(&["n.name"], vec![]));
        assert!(session.query_for_object("String", cypher, props!()).unwrap().is_none());

        // one row
        server.reply(replies::rows(&["n.name"], vec![vec![json!("Ada")]]));
        let one = session.query_for_object("String", cypher, props!()).unwrap().unwrap();
        assert_eq!(one.into_value(), Some(Value::from("Ada")));

        // two rows
        server.reply(replies::rows(&["n.name"], vec![vec![json!("Ada")], vec![json!("Bob")]]));
        assert!(matches!(
            session.query_for_object("String", cypher, props!()),
            Err(SessionError::IncorrectResultSize { expected: 1, actual: 2 })
        ));
    }

    #[test]
    fn test_server_error_surfaces_as_request_error() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        server.reply(replies::error("Neo.ClientError.Statement.SyntaxError", "Invalid input"));

        let result = session.query("MATCH (n RETURN n", props!());

        assert!(matches!(result, Err(SessionError::Request(_))));
    }
}

mod execute {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_execute_returns_update_counters() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        server.reply(replies::stats(json!({"contains_updates": true, "properties_set": 2})));

        let stats = session.execute("MATCH (n:Person) SET n.flag = true").unwrap();

        assert!(stats.contains_updates);
        assert_eq!(stats.properties_set, 2);
        let statement = server.last_statement().unwrap();
        assert_eq!(statement["includeStats"], json!(true));
        assert_eq!(statement["parameters"], json!({}));
    }

    #[test]
    fn test_execute_with_parameters() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);

        session
            .execute_with("MATCH (n:Person {name: $name}) SET n.flag = true", props! { "name" => "Ada" })
            .unwrap();

        assert_eq!(server.last_statement().unwrap()["parameters"], json!({"name": "Ada"}));
    }
}

mod counts {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unmapped_type_counts_zero_without_request() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);

        assert_eq!(session.count_entities_of_type("Studio").unwrap(), 0);
        assert_eq!(server.request_count(), 0);
    }

    #[test]
    fn test_count_nodes_by_label() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        server.reply(replies::rows(&["COUNT(n)"], vec![vec![json!(3)]]));

        assert_eq!(session.count_entities_of_type("Person").unwrap(), 3);
        assert_eq!(server.statements(), vec!["MATCH (n:`Person`) RETURN COUNT(n)".to_string()]);
    }

    #[test]
    fn test_count_relationship_entities_by_type() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        server.reply(replies::rows(&["COUNT(r)"], vec![vec![json!(5)]]));

        assert_eq!(session.count_entities_of_type("Role").unwrap(), 5);
        assert_eq!(
            server.statements(),
            vec!["MATCH ()-[r:`ACTS_IN`]->() RETURN COUNT(r)".to_string()]
        );
    }
}

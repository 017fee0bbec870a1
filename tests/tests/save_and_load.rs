//! Saving objects and loading them back.

use pretty_assertions::assert_eq;
use strand_tests::prelude::*;

mod round_trip {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_saved_object_loads_back_equal() {
        // GIVEN a new person
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        let ada = person("Ada");
        with_entity_mut::<Person, _>(&ada, |p| p.born = Some(1815));
        server.reply(replies::created(&[("n0", 1)]));

        // WHEN saved
        session.save(&ada).unwrap();

        // THEN it received its identity through a create statement
        assert_eq!(ada.borrow().id(), Some(1));
        let create = server.last_statement().unwrap();
        assert_eq!(create["statement"], "CREATE (n0:`Person` $n0_props) RETURN id(n0) AS n0");
        assert_eq!(
            create["parameters"]["n0_props"],
            json!({"name": "Ada", "year_of_birth": 1815})
        );

        // AND a fresh session loads an equal object for that identity
        let (mut fresh, fresh_server) = strand_tests::prelude::session(&metadata);
        fresh_server.reply(replies::graph(
            vec![replies::node(1, "Person", json!({"name": "Ada", "year_of_birth": 1815}))],
            vec![],
        ));
        let loaded = fresh.load("Person", 1).unwrap().unwrap();
        assert!(!same_object(&loaded, &ada));
        assert_eq!(
            with_entity::<Person, _>(&loaded, |p| (p.name.clone(), p.born)),
            Some(("Ada".to_string(), Some(1815)))
        );
        assert_eq!(
            fresh_server.last_statement().unwrap()["statement"],
            "MATCH (n) WHERE ID(n) = $id WITH n MATCH p=(n)-[*0..1]-(m) RETURN p"
        );
    }

    #[test]
    fn test_same_session_returns_tracked_object() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        let ada = person("Ada");
        server.reply(replies::created(&[("n0", 1)]));
        session.save(&ada).unwrap();

        server.reply(replies::graph(
            vec![replies::node(1, "Person", json!({"name": "Ada"}))],
            vec![],
        ));
        let loaded = session.load("Person", 1).unwrap().unwrap();

        assert!(same_object(&loaded, &ada));
    }

    #[test]
    fn test_changed_object_is_updated_not_recreated() {
        // GIVEN a saved person
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        let ada = person("Ada");
        server.reply(replies::created(&[("n0", 1)]));
        session.save(&ada).unwrap();

        // WHEN a property changes and it is saved again
        with_entity_mut::<Person, _>(&ada, |p| p.born = Some(1815));
        session.save(&ada).unwrap();

        // THEN an update statement carries the renamed property
        let update = server.last_statement().unwrap();
        assert_eq!(update["statement"], "MATCH (n) WHERE ID(n) = $id SET n += $props");
        assert_eq!(update["parameters"]["id"], json!(1));
        assert_eq!(update["parameters"]["props"]["year_of_birth"], json!(1815));
    }

    #[test]
    fn test_unchanged_object_makes_no_request() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        let ada = person("Ada");
        server.reply(replies::created(&[("n0", 1)]));
        session.save(&ada).unwrap();

        session.save(&ada).unwrap();

        assert_eq!(server.request_count(), 1);
    }

    #[test]
    fn test_missing_identity_in_reply_fails() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        server.reply(replies::rows(&["n0"], vec![]));

        let result = session.save(&person("Ada"));

        assert!(matches!(result, Err(SessionError::Mapping(_))));
    }
}

mod save_depth {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_depth_zero_saves_only_the_root() {
        // GIVEN two new friends
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        let ada = person("Ada");
        let bob = person("Bob");
        befriend(&ada, &bob);
        server.reply(replies::created(&[("n0", 1)]));

        // WHEN saved at depth 0
        session.save_with_depth(&ada, 0).unwrap();

        // THEN only the root was written
        assert_eq!(
            server.statements(),
            vec!["CREATE (n0:`Person` $n0_props) RETURN id(n0) AS n0".to_string()]
        );
        assert_eq!(ada.borrow().id(), Some(1));
        assert_eq!(bob.borrow().id(), None);
    }

    #[test]
    fn test_depth_one_saves_immediate_neighbours() {
        // GIVEN a chain ada - bob - cy
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        let ada = person("Ada");
        let bob = person("Bob");
        let cy = person("Cy");
        befriend(&ada, &bob);
        befriend(&bob, &cy);
        server.reply(replies::created(&[("n0", 1), ("n1", 2), ("r0", 10)]));

        // WHEN ada is saved at depth 1
        session.save_with_depth(&ada, 1).unwrap();

        // THEN ada, bob and their friendship are written, cy is not
        assert_eq!(
            server.statements(),
            vec![
                "CREATE (n0:`Person` $n0_props) CREATE (n1:`Person` $n1_props) \
                 MERGE (n0)-[r0:`FRIENDS`]->(n1) RETURN id(n0) AS n0, id(n1) AS n1, id(r0) AS r0"
                    .to_string()
            ]
        );
        assert_eq!(ada.borrow().id(), Some(1));
        assert_eq!(bob.borrow().id(), Some(2));
        assert_eq!(cy.borrow().id(), None);
        assert_eq!(session.context().relationship_count(), 1);
    }

    #[test]
    fn test_unbounded_depth_terminates_on_cycles() {
        // GIVEN a friendship triangle
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        let ada = person("Ada");
        let bob = person("Bob");
        let cy = person("Cy");
        befriend(&ada, &bob);
        befriend(&bob, &cy);
        befriend(&cy, &ada);
        server.reply(replies::created(&[
            ("n0", 1),
            ("n1", 2),
            ("n2", 3),
            ("r0", 10),
            ("r1", 11),
            ("r2", 12),
        ]));

        // WHEN saved with unbounded depth
        session.save_with_depth(&ada, -1).unwrap();

        // THEN one create statement writes three nodes and three relationships
        let statements = server.statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].matches("CREATE (n").count(), 3);
        assert_eq!(statements[0].matches("MERGE").count(), 3);
        assert!(ada.borrow().id().is_some());
        assert!(bob.borrow().id().is_some());
        assert!(cy.borrow().id().is_some());
        assert_eq!(session.context().relationship_count(), 3);

        // AND a second save finds nothing to write
        session.save_with_depth(&ada, -1).unwrap();
        assert_eq!(server.request_count(), 1);
    }

    #[test]
    fn test_save_all_saves_each_element() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        let people = vec![person("Ada"), person("Bob")];
        server.reply(replies::created(&[("n0", 1)]));
        server.reply(replies::created(&[("n0", 2)]));

        session.save_all(&people, 1).unwrap();

        assert_eq!(server.request_count(), 2);
        assert_eq!(people[0].borrow().id(), Some(1));
        assert_eq!(people[1].borrow().id(), Some(2));
    }

    #[test]
    fn test_configured_save_depth_applies() {
        let metadata = metadata();
        let server = ScriptedServer::new();
        let config = SessionConfig::new(BASE_URL).with_save_depth(0);
        let mut session = Session::with_config(&metadata, server.clone(), config);
        let ada = person("Ada");
        befriend(&ada, &person("Bob"));
        server.reply(replies::created(&[("n0", 1)]));

        session.save(&ada).unwrap();

        assert_eq!(server.statements()[0].matches("CREATE").count(), 1);
    }
}

mod relationship_entities {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_saving_a_role_saves_its_endpoints() {
        // GIVEN a role between a new actor and a new movie
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        let keanu = person("Keanu");
        let matrix = movie("The Matrix");
        let neo = role("Neo", &keanu, &matrix);
        server.reply(replies::created(&[("n0", 1), ("n1", 2), ("r0", 3)]));

        // WHEN the role is saved
        session.save(&neo).unwrap();

        // THEN the relationship is created with its properties, after both nodes
        let statement = server.last_statement().unwrap();
        let text = statement["statement"].as_str().unwrap().to_string();
        let rel = text.find("[r0:`ACTS_IN` $r0_props]").unwrap();
        assert!(text.find("CREATE (n0").unwrap() < rel);
        assert!(text.find("CREATE (n1").unwrap() < rel);
        assert_eq!(statement["parameters"]["r0_props"], json!({"character": "Neo"}));

        // AND every element has its identity
        assert_eq!(neo.borrow().id(), Some(3));
        let mut ids = vec![keanu.borrow().id().unwrap(), matrix.borrow().id().unwrap()];
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_loading_a_role_links_both_ends() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        server.reply(replies::graph(
            vec![
                replies::node(1, "Person", json!({"name": "Keanu"})),
                replies::node(2, "Movie", json!({"title": "The Matrix", "released": 1999})),
            ],
            vec![replies::relationship(3, "ACTS_IN", 1, 2, json!({"character": "Neo"}))],
        ));

        let neo = session.load("Role", 3).unwrap().unwrap();

        assert_eq!(
            server.last_statement().unwrap()["statement"],
            "MATCH (n)-[r]->() WHERE ID(r) = $id WITH n MATCH p=(n)-[*0..1]-() RETURN p"
        );
        let (actor, film) = with_entity::<Role, _>(&neo, |r| (r.actor.clone(), r.movie.clone())).unwrap();
        let actor = actor.unwrap();
        let film = film.unwrap();
        assert_eq!(actor.borrow().property("name"), Value::from("Keanu"));
        assert_eq!(film.borrow().property("released"), Value::Int(1999));
        assert_eq!(actor.borrow().related("roles").len(), 1);
        assert_eq!(film.borrow().related("cast").len(), 1);
    }

    #[test]
    fn test_moving_a_role_to_another_movie_recreates_it() {
        // GIVEN a loaded role and another loaded movie
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        server.reply(replies::graph(
            vec![
                replies::node(1, "Person", json!({"name": "Keanu"})),
                replies::node(2, "Movie", json!({"title": "The Matrix"})),
            ],
            vec![replies::relationship(5, "ACTS_IN", 1, 2, json!({"character": "Neo"}))],
        ));
        let neo = session.load("Role", 5).unwrap().unwrap();
        server.reply(replies::graph(
            vec![replies::node(3, "Movie", json!({"title": "John Wick"}))],
            vec![],
        ));
        let wick = session.load("Movie", 3).unwrap().unwrap();

        // WHEN the role is pointed at the other movie and saved alone
        with_entity_mut::<Role, _>(&neo, |r| r.movie = Some(wick.clone()));
        server.reply(replies::created(&[("r0", 9)]));
        session.save_with_depth(&neo, 0).unwrap();

        // THEN a new relationship is created with the properties and the old one deleted
        let statements = server.posted_statements();
        let (_, create) = &statements[statements.len() - 2];
        let (_, delete) = &statements[statements.len() - 1];
        assert_eq!(
            create["statement"],
            "MATCH (e0) WHERE ID(e0) = $e0 MATCH (e1) WHERE ID(e1) = $e1 \
             CREATE (e0)-[r0:`ACTS_IN` $r0_props]->(e1) RETURN id(r0) AS r0"
        );
        assert_eq!(create["parameters"]["e1"], json!(3));
        assert_eq!(create["parameters"]["r0_props"], json!({"character": "Neo"}));
        assert_eq!(delete["statement"], "MATCH ()-[r]->() WHERE ID(r) = $id DELETE r");
        assert_eq!(delete["parameters"]["id"], json!(5));

        // AND the role carries its new identity, so saving again is a no-op
        assert_eq!(neo.borrow().id(), Some(9));
        let before = server.request_count();
        session.save_with_depth(&neo, 0).unwrap();
        assert_eq!(server.request_count(), before);
    }
}

mod loading {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_all_by_ids_keeps_requested_order() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        server.reply(replies::graph(
            vec![
                replies::node(1, "Person", json!({"name": "Ada"})),
                replies::node(2, "Person", json!({"name": "Bob"})),
            ],
            vec![],
        ));

        let people = session.load_all_by_ids("Person", &[2, 1, 9], 0).unwrap();

        let names: Vec<Value> = people.iter().map(|p| p.borrow().property("name")).collect();
        assert_eq!(names, vec![Value::from("Bob"), Value::from("Ada")]);
        assert_eq!(
            server.last_statement().unwrap()["statement"],
            "MATCH (n) WHERE ID(n) IN $ids RETURN n"
        );
    }

    #[test]
    fn test_load_all_of_type_links_friends() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        server.reply(replies::graph(
            vec![
                replies::node(1, "Person", json!({"name": "Ada"})),
                replies::node(2, "Person", json!({"name": "Bob"})),
                replies::node(3, "Movie", json!({"title": "Up"})),
            ],
            vec![replies::relationship(7, "FRIENDS", 1, 2, json!({}))],
        ));

        let people = session.load_all("Person").unwrap();

        assert_eq!(people.len(), 2);
        assert_eq!(people[0].borrow().related("friends").len(), 1);
        assert_eq!(people[1].borrow().related("friends").len(), 1);
        assert_eq!(
            server.last_statement().unwrap()["statement"],
            "MATCH (n:`Person`) WITH n MATCH p=(n)-[*0..1]-(m) RETURN p"
        );
    }

    #[test]
    fn test_reload_all_of_empty_collection_makes_no_request() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);

        let reloaded = session.reload_all(&[], 1).unwrap();

        assert!(reloaded.is_empty());
        assert_eq!(server.request_count(), 0);
    }

    #[test]
    fn test_reload_all_uses_identities_of_objects() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        let ada = person("Ada");
        ada.borrow_mut().set_id(Some(4));

        session.reload_all(&[ada, person("New")], 0).unwrap();

        assert_eq!(server.last_statement().unwrap()["parameters"]["ids"], json!([4]));
    }

    #[test]
    fn test_load_by_property_resolves_renamed_property() {
        // GIVEN a server matching one person born in 1815
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        server.reply(replies::graph_rows(vec![(
            vec![replies::node(1, "Person", json!({"name": "Ada", "year_of_birth": 1815}))],
            vec![],
            1,
        )]));

        // WHEN loaded by the field name
        let found = session
            .load_by_property("Person", Filter::new("born", 1815i64), 0)
            .unwrap();

        // THEN the statement filters on the graph property name
        let statement = server.last_statement().unwrap();
        assert_eq!(
            statement["statement"],
            "MATCH (n:`Person`) WHERE n.`year_of_birth` = $p0 RETURN n, ID(n)"
        );
        assert_eq!(statement["resultDataContents"], json!(["graph", "row"]));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].borrow().property("name"), Value::from("Ada"));
    }

    #[test]
    fn test_load_by_nested_property_matches_through_relationship() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        server.reply(replies::graph_rows(vec![(
            vec![
                replies::node(1, "Person", json!({"name": "Ada"})),
                replies::node(2, "Person", json!({"name": "Bob"})),
            ],
            vec![replies::relationship(7, "FRIENDS", 1, 2, json!({}))],
            1,
        )]));

        let found = session
            .load_by_properties(
                "Person",
                &[Filter::new("name", "Bob").nested("friends", "Person")],
                1,
            )
            .unwrap();

        assert_eq!(
            server.last_statement().unwrap()["statement"],
            "MATCH (n:`Person`) MATCH (m0:`Person`) WHERE m0.`name` = $p0 \
             MATCH (n)-[:`FRIENDS`]-(m0) WITH n MATCH p=(n)-[*0..1]-(m) RETURN p, ID(n)"
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].borrow().id(), Some(1));
    }

    #[test]
    fn test_reload_drops_properties_missing_on_server() {
        // GIVEN a loaded person with a year of birth
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        server.reply(replies::graph(
            vec![replies::node(1, "Person", json!({"name": "Ada", "year_of_birth": 1815}))],
            vec![],
        ));
        let ada = session.load("Person", 1).unwrap().unwrap();

        // WHEN it is loaded again after the property was removed on the server
        server.reply(replies::graph(
            vec![replies::node(1, "Person", json!({"name": "Ada"}))],
            vec![],
        ));
        let reloaded = session.load("Person", 1).unwrap().unwrap();

        // THEN the local value is cleared and the object is clean
        assert!(same_object(&ada, &reloaded));
        assert_eq!(with_entity::<Person, _>(&ada, |p| p.born), Some(None));
        let before = server.request_count();
        session.save(&ada).unwrap();
        assert_eq!(server.request_count(), before);
    }

    #[test]
    fn test_load_of_node_with_other_label_finds_nothing() {
        let metadata = metadata();
        let (mut session, server) = session(&metadata);
        server.reply(replies::graph(
            vec![replies::node(1, "Person", json!({"name": "Ada"}))],
            vec![],
        ));

        let loaded = session.load("Movie", 1).unwrap();

        assert!(loaded.is_none());
    }
}

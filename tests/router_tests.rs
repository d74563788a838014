use http::Method;
use routeset::config::RouterConfig;
use routeset::{RouteDecl, RouteSet, RoutingError, StaticRegistry};
use std::sync::Arc;

mod common;
use common::handlers::{cascade, echo_registry, handled_by, param};

fn photo_registry() -> StaticRegistry {
    echo_registry(&[
        "PhotosController",
        "Admin::PhotosController",
        "UsersController",
        "not_found",
        "assets",
    ])
}

fn route_set(registry: StaticRegistry) -> RouteSet {
    RouteSet::new(Arc::new(registry))
}

fn get(set: &RouteSet, path: &str) -> Result<routeset::HandlerResponse, RoutingError> {
    set.call(&routeset::Request::new(Method::GET, path))
}

#[test]
fn test_declaration_order_wins() {
    let set = route_set(photo_registry());
    set.draw(|map| {
        map.get("/photos/:id", "photos#show")?;
        map.get("/photos/new", "photos#new")?;
        Ok(())
    })
    .unwrap();

    let matched = set.recognize(&Method::GET, "/photos/new").unwrap();
    assert_eq!(matched.param("action"), Some("show"));
    assert_eq!(matched.param("id"), Some("new"));

    set.draw(|map| {
        map.get("/photos/new", "photos#new")?;
        map.get("/photos/:id", "photos#show")?;
        Ok(())
    })
    .unwrap();
    let matched = set.recognize(&Method::GET, "/photos/new").unwrap();
    assert_eq!(matched.param("action"), Some("new"));
    assert_eq!(matched.param("id"), None);
}

#[test]
fn test_verbs_filter_routes() {
    let set = route_set(photo_registry());
    set.draw(|map| {
        map.get("/photos", "photos#index")?;
        map.post("/photos", "photos#create")?;
        map.delete("/photos/:id", "photos#destroy")?;
        Ok(())
    })
    .unwrap();

    assert_eq!(set.recognize(&Method::GET, "/photos").unwrap().param("action"), Some("index"));
    assert_eq!(set.recognize(&Method::POST, "/photos").unwrap().param("action"), Some("create"));
    assert_eq!(
        set.recognize(&Method::DELETE, "/photos/3").unwrap().param("action"),
        Some("destroy")
    );
    assert_eq!(
        set.recognize(&Method::DELETE, "/photos").unwrap_err(),
        RoutingError::NoRoute {
            path: "/photos".to_string()
        }
    );
}

#[test]
fn test_head_falls_back_to_get() {
    let set = route_set(photo_registry());
    set.draw(|map| map.get("/photos", "photos#index").map(|_| ())).unwrap();
    let matched = set.recognize(&Method::HEAD, "/photos").unwrap();
    assert_eq!(matched.param("action"), Some("index"));

    let strict = RouteSet::with_config(
        Arc::new(photo_registry()),
        RouterConfig {
            head_fallback: false,
            ..RouterConfig::default()
        },
    );
    strict.draw(|map| map.get("/photos", "photos#index").map(|_| ())).unwrap();
    assert!(strict.recognize(&Method::HEAD, "/photos").is_err());
}

#[test]
fn test_unknown_dynamic_controller_cascades() {
    let set = route_set(photo_registry());
    set.draw(|map| {
        map.add(RouteDecl::new("/:controller(/:action(/:id))"))?;
        map.add(RouteDecl::new("/*path").handler("not_found"))?;
        Ok(())
    })
    .unwrap();

    let response = get(&set, "/photos/show/3").unwrap();
    assert_eq!(handled_by(&response), "PhotosController");
    assert_eq!(param(&response, "id"), Some("3"));

    let response = get(&set, "/unknown/things").unwrap();
    assert_eq!(handled_by(&response), "not_found");
    assert_eq!(param(&response, "path"), Some("unknown/things"));
}

#[test]
fn test_dynamic_controller_gets_default_action() {
    let set = route_set(photo_registry());
    set.draw(|map| map.add(RouteDecl::new("/:controller(/:action)")).map(|_| ()))
        .unwrap();
    let matched = set.recognize(&Method::GET, "/users").unwrap();
    assert_eq!(&*matched.handler_id, "UsersController");
    assert_eq!(matched.param("action"), Some("index"));
}

#[test]
fn test_missing_literal_handler_is_error() {
    let set = route_set(photo_registry());
    set.draw(|map| {
        map.get("/gone", "gone#index")?;
        map.add(RouteDecl::new("/*path").handler("not_found"))?;
        Ok(())
    })
    .unwrap();

    assert_eq!(
        get(&set, "/gone").unwrap_err(),
        RoutingError::MissingHandler {
            path: "/gone".to_string(),
            handler: "GoneController".to_string(),
        }
    );
}

#[test]
fn test_handler_cascade_tries_next_route() {
    let mut registry = photo_registry();
    registry.register("maintenance", cascade);
    let set = route_set(registry);
    set.draw(|map| {
        map.add(RouteDecl::get("/photos").handler("maintenance"))?;
        map.get("/photos", "photos#index")?;
        Ok(())
    })
    .unwrap();

    let response = get(&set, "/photos").unwrap();
    assert_eq!(handled_by(&response), "PhotosController");
}

#[test]
fn test_all_cascade_is_no_route() {
    let mut registry = StaticRegistry::new();
    registry.register("maintenance", cascade);
    let set = route_set(registry);
    set.draw(|map| map.add(RouteDecl::get("/photos").handler("maintenance")).map(|_| ()))
        .unwrap();
    assert!(matches!(get(&set, "/photos"), Err(RoutingError::NoRoute { .. })));
}

#[test]
fn test_constraints_and_format() {
    let set = route_set(photo_registry());
    set.draw(|map| {
        map.add(
            RouteDecl::get("/photos/:id(.:format)")
                .to("photos#show")
                .constraint("id", r"\d+"),
        )?;
        Ok(())
    })
    .unwrap();

    let matched = set.recognize(&Method::GET, "/photos/12.json").unwrap();
    assert_eq!(matched.param("id"), Some("12"));
    assert_eq!(matched.param("format"), Some("json"));
    assert!(set.recognize(&Method::GET, "/photos/abc").is_err());
}

#[test]
fn test_captures_are_unescaped() {
    let set = route_set(photo_registry());
    set.draw(|map| map.get("/photos/:id", "photos#show").map(|_| ())).unwrap();
    let matched = set.recognize(&Method::GET, "/photos/hello%20world").unwrap();
    assert_eq!(matched.param("id"), Some("hello world"));
}

#[test]
fn test_namespaced_controller_id() {
    let set = route_set(photo_registry());
    set.draw(|map| map.get("/admin/photos", "admin/photos#index").map(|_| ()))
        .unwrap();
    let response = get(&set, "/admin/photos").unwrap();
    assert_eq!(handled_by(&response), "Admin::PhotosController");
    assert_eq!(param(&response, "controller"), Some("admin/photos"));
}

#[test]
fn test_unanchored_route_matches_prefix() {
    let set = route_set(photo_registry());
    set.draw(|map| map.add(RouteDecl::new("/assets").handler("assets").unanchored()).map(|_| ()))
        .unwrap();
    assert!(get(&set, "/assets/app.js").is_ok());
    assert!(get(&set, "/assets").is_ok());
    assert!(get(&set, "/assetsx").is_err());
}

#[test]
fn test_query_string_and_slashes_ignored() {
    let set = route_set(photo_registry());
    set.draw(|map| map.get("/photos/:id", "photos#show").map(|_| ())).unwrap();
    let response = get(&set, "/photos/9/?sort=asc").unwrap();
    assert_eq!(param(&response, "id"), Some("9"));
    assert_eq!(param(&response, "sort"), None);
}

#[test]
fn test_recognize_ignores_query_string() {
    let set = route_set(photo_registry());
    set.draw(|map| map.get("/photos/:id", "photos#show").map(|_| ())).unwrap();
    let matched = set.recognize(&Method::GET, "/photos/1?page=2").unwrap();
    assert_eq!(matched.param("id"), Some("1"));
    assert_eq!(matched.param("page"), None);
}

#[test]
fn test_declared_paths_are_normalized() {
    let set = route_set(photo_registry());
    set.draw(|map| {
        map.get("photos/:id", "photos#show")?;
        map.get("/users/", "users#index")?;
        Ok(())
    })
    .unwrap();

    assert_eq!(set.recognize(&Method::GET, "/photos/1").unwrap().param("id"), Some("1"));
    assert_eq!(set.recognize(&Method::GET, "/users/").unwrap().param("action"), Some("index"));
    assert_eq!(set.recognize(&Method::GET, "/users").unwrap().param("action"), Some("index"));
}

#[test]
fn test_recognize_with_extras() {
    let set = route_set(photo_registry());
    set.draw(|map| map.get("/photos/:id", "photos#show").map(|_| ())).unwrap();
    let extras = routeset::params! { "locale" => "fr", "id" => "override" };
    let matched = set
        .recognize_with_extras(&Method::GET, "/photos/1", &extras)
        .unwrap();
    assert_eq!(matched.param("locale"), Some("fr"));
    assert_eq!(matched.param("id"), Some("override"));
    assert_eq!(matched.param("controller"), Some("photos"));
}

#[test]
fn test_recognition_is_deterministic() {
    let set = route_set(photo_registry());
    set.draw(|map| {
        map.get("/photos/:id", "photos#show")?;
        map.get("/photos/:id/edit", "photos#edit")?;
        map.add(RouteDecl::new("/*path").handler("not_found"))?;
        Ok(())
    })
    .unwrap();
    for _ in 0..10 {
        let matched = set.recognize(&Method::GET, "/photos/1/edit").unwrap();
        assert_eq!(matched.param("action"), Some("edit"));
        assert_eq!(matched.route.index(), 1);
    }
}

use http::Method;
use routeset::hot_reload::watch_routes;
use routeset::RouteSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

mod common;
use common::handlers::echo_registry;
use common::temp_files;

const ROUTES_V1: &str = r#"routes:
  - path: /foo
    via: [GET]
    to: foo#one
"#;

const ROUTES_V2: &str = r#"routes:
  - path: /foo
    via: [GET]
    to: foo#two
  - path: /bar
    via: [GET]
    to: foo#bar
"#;

#[test]
fn test_watch_routes_reload() {
    let file = temp_files::create_temp_yaml(ROUTES_V1);
    let routes = Arc::new(RouteSet::new(Arc::new(echo_registry(&["FooController"]))));
    routes
        .draw_decls(routeset::config::load_routes(file.path()).unwrap().routes)
        .unwrap();
    assert_eq!(
        routes.recognize(&Method::GET, "/foo").unwrap().param("action"),
        Some("one")
    );

    let counts: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let counts_clone = Arc::clone(&counts);
    let watcher = watch_routes(file.path(), Arc::clone(&routes), move |_set, count| {
        counts_clone.lock().unwrap().push(count);
    })
    .expect("watch_routes");

    // allow watcher thread to start
    std::thread::sleep(Duration::from_millis(100));

    std::fs::write(file.path(), ROUTES_V2).unwrap();

    for _ in 0..40 {
        if counts.lock().unwrap().contains(&2) {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    assert!(counts.lock().unwrap().contains(&2));
    assert_eq!(
        routes.recognize(&Method::GET, "/foo").unwrap().param("action"),
        Some("two")
    );
    assert!(routes.recognize(&Method::GET, "/bar").is_ok());

    drop(watcher);
}

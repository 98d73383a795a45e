use pretty_assertions::assert_eq;
use std::{cell::Cell, rc::Rc};
use vdom_runtime::{
	app::App,
	children,
	dispatcher::Emitter,
	element,
	memory::{MemoryHost, NodeId},
	text,
	vnode::{Child, Event, Props},
	Error, VNode,
};

mod memory_host_;
use memory_host_::*;

#[derive(Debug, Clone, Default)]
struct Todos {
	items: Vec<Todo>,
	next_id: u32,
}

#[derive(Debug, Clone)]
struct Todo {
	id: u32,
	title: String,
	done: bool,
}

fn view(todos: &Todos, emitter: &Emitter<String>) -> VNode<NodeId> {
	let add = emitter.clone();
	element(
		"div",
		Props::new(),
		children![
			element(
				"input",
				Props::new().attr("placeholder", "Todo").on("change", move |event| {
					if let Some(title) = event.value() {
						add.emit("add", title.to_owned())
					}
				}),
				children![],
			),
			element(
				"ul",
				Props::new(),
				todos.items.iter().map(|todo| {
					let toggle = emitter.clone();
					let id = todo.id.to_string();
					Child::Node(element(
						"li",
						Props::new().key(todo.id.to_string()).class(if todo.done { "done" } else { "" }),
						children![
							todo.title.clone(),
							element("button", Props::new().on("click", move |_| toggle.emit("toggle", id.clone())), children!["toggle"]),
						],
					))
				}),
			),
			if todos.items.is_empty() { Some(text("Nothing to do.")) } else { None },
		],
	)
}

fn todo_app(host: &MemoryHost) -> App<MemoryHost, Todos, String> {
	App::new(host.clone(), Todos::default(), view)
		.with_reducer("add", |todos: &Todos, title: &String| {
			let mut next = todos.clone();
			next.items.push(Todo {
				id: next.next_id,
				title: title.clone(),
				done: false,
			});
			next.next_id += 1;
			next
		})
		.with_reducer("toggle", |todos: &Todos, id: &String| {
			let mut next = todos.clone();
			for todo in next.items.iter_mut().filter(|todo| todo.id.to_string() == *id) {
				todo.done = !todo.done;
			}
			next
		})
		.with_reducer("clear-done", |todos: &Todos, _: &String| {
			let mut next = todos.clone();
			next.items.retain(|todo| !todo.done);
			next
		})
}

/// The `<li>`s of the mounted todo list.
fn items(host: &MemoryHost, root: NodeId) -> Vec<NodeId> {
	let div = host.children(root)[0];
	host.children(host.children(div)[1])
}

#[test]
fn todo_list() {
	let (host, root) = host_and_root();
	let app = todo_app(&host);

	app.mount(&root).unwrap();
	assert_eq!(host.inner_html(root), r#"<div><input placeholder="Todo"></input><ul></ul>Nothing to do.</div>"#);
	let div = host.children(root)[0];
	let input = host.children(div)[0];

	app.emit("add", "Milk".to_owned()).unwrap();
	host.dispatch_event(input, &Event::new("change").with_value("Eggs"));
	assert_eq!(
		host.inner_html(root),
		r#"<div><input placeholder="Todo"></input><ul><li>Milk<button>toggle</button></li><li>Eggs<button>toggle</button></li></ul></div>"#
	);
	assert_eq!(host.children(root)[0], div, "The root element is patched, not replaced.");
	assert_eq!(app.state().items.len(), 2);

	let before = items(&host, root);
	let milk_button = host.children(before[0])[1];
	assert_eq!(host.dispatch_event(milk_button, &Event::new("click")), 1);
	assert_eq!(host.class(before[0]).as_deref(), Some("done"));
	assert_eq!(items(&host, root), before);

	app.emit("clear-done", String::new()).unwrap();
	assert_eq!(items(&host, root), vec![before[1]]);
	assert_eq!(
		host.inner_html(root),
		r#"<div><input placeholder="Todo"></input><ul><li>Eggs<button>toggle</button></li></ul></div>"#
	);
	assert!(app.take_render_error().is_none());

	let emitter = app.emitter();
	app.unmount().unwrap();
	assert!(host.children(root).is_empty());
	assert_eq!(host.listener_count(input), 0);

	// Nothing is subscribed anymore.
	emitter.emit("add", "Bread".to_owned());
	assert!(host.children(root).is_empty());
}

#[test]
fn unknown_commands_still_render() {
	let (host, root) = host_and_root();
	let renders = Rc::new(Cell::new(0));
	let app = App::new(host.clone(), (), {
		let renders = Rc::clone(&renders);
		move |_: &(), _: &Emitter<()>| {
			renders.set(renders.get() + 1);
			text(renders.get().to_string())
		}
	});

	app.mount(&root).unwrap();
	app.emit("unknown", ()).unwrap();

	assert_eq!(renders.get(), 2);
	assert_eq!(host.inner_html(root), "2");
	app.with_vdom(|vdom| assert!(fully_mounted(vdom.unwrap())));
}

#[test]
fn lifecycle_misuse() {
	let (host, root) = host_and_root();
	let app = App::new(host.clone(), (), |_: &(), _: &Emitter<()>| text("x"));
	let result = app.unmount();
	assert!(matches!(result, Err(Error::NotMounted)), "{:?}", result);

	let app = App::new(host.clone(), (), |_: &(), _: &Emitter<()>| text("x"));
	app.mount(&root).unwrap();
	let result = app.mount(&root);
	assert!(matches!(result, Err(Error::AlreadyMounted)), "{:?}", result);
	assert_eq!(host.inner_html(root), "x");

	let text_node = host.children(root)[0];
	let app = App::new(host, (), |_: &(), _: &Emitter<()>| text("y"));
	let result = app.mount(&text_node);
	assert!(matches!(result, Err(Error::InvalidMountTarget(_))), "{:?}", result);
}

#[test]
fn render_errors_are_returned_from_emit() {
	let (host, root) = host_and_root();
	let app = App::new(host.clone(), 0_i32, |count: &i32, _: &Emitter<()>| {
		element(if *count > 0 { "not a tag" } else { "p" }, Props::new(), children![])
	})
	.with_reducer("increment", |count, _| count + 1);

	app.mount(&root).unwrap();
	let result = app.emit("increment", ());
	assert!(matches!(result, Err(Error::Host(_))), "{:?}", result);
	assert!(app.take_render_error().is_none());

	// The tree is lost after a failed render cycle.
	let result = app.emit("increment", ());
	assert!(matches!(result, Err(Error::PreconditionViolation(_))), "{:?}", result);
	app.with_vdom(|vdom| assert!(vdom.is_none()));
}

use lisplet::interpreter::{Interpreter, Lisp};
use lisplet::{cmdline, printer};

fn main() -> std::io::Result<()> {
    pretty_env_logger::init();
    let lisp = Lisp::new();
    let env = lisp.root_environment();
    let interface = cmdline::setup()?;
    cmdline::repl(&interface, |line| {
        let result = lisp.evaluate_in(&env, line);
        printer::print(&result, &lisp.symbols().borrow())
    });
    cmdline::save_history(&interface)
}

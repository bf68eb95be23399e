use thread_probe::*;

extern "C" fn report(token: Token) {
    println!(
        "callback ran on thread {} with token {}",
        current_thread_id(),
        token.into_raw()
    );
}

fn main() {
    let main_loop = MessageLoop::new().unwrap();
    println!("caller thread id: {}", current_thread_id());
    println!("main thread id:   {}", main_thread_id(&main_loop));
    println!("a fresh worker:   {:?}", spawned_thread_id());
    run_on_main_thread(&main_loop, report, Token::from_raw(7));
}

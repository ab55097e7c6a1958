#[macro_use]
extern crate rocket;

#[launch]
fn rocket() -> _ {
    log::info!("Starting task server");
    task_server::rocket()
}

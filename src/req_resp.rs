#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum RequestOrResponse {
    Request,
    Response,
}

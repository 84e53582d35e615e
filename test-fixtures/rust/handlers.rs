use actix_web::{get, post, web, HttpResponse, Responder};

diesel::table! {
    books (id) {
        id -> Int4,
        title -> Varchar,
        isbn -> Nullable<Varchar>,
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = books)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub isbn: Option<String>,
}

#[get("/books/{id}")]
async fn get_book(path: web::Path<i32>) -> impl Responder {
    HttpResponse::Ok().finish()
}

#[post("/books")]
async fn create_book(body: web::Json<NewBook>) -> impl Responder {
    HttpResponse::Created().finish()
}

use axum::{
    extract::{Path, Query},
    http::{StatusCode, Uri},
    Extension, Json,
};

use crate::{
    data_formats::{
        ArticleQueryParams, ChildQueryParams, ContactRequest, CreateArticleRequest,
        CreateCategoryRequest, CreateMediaRequest, CreateResourceRequest, CreateSectionRequest,
        SubscribeRequest, UpdateArticleRequest, UpdateCategoryRequest, UpdateContactRequest,
        UpdateSectionRequest, UpdateSubscriberRequest,
    },
    errors::RequestError,
    models::{Article, Category, Contact, ContentSection, MediaFile, Resource, Subscriber},
    JsonResponse, Store,
};

type JsonResult<T> = Result<Json<T>, RequestError>;
type CreatedResult<T> = Result<JsonResponse<T>, RequestError>;

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> Result<(), (StatusCode, String)> {
    Err((
        StatusCode::NOT_FOUND,
        format!("URL {} provided was not found", uri),
    ))
}

// ----------------- Category Handlers -----------------
pub async fn list_categories(Extension(store): Extension<Store>) -> Json<Vec<Category>> {
    Json(store.list_categories().await)
}

pub async fn get_category(
    Extension(store): Extension<Store>,
    Path(slug): Path<String>,
) -> JsonResult<Category> {
    store
        .get_category_by_slug(&slug)
        .await
        .map(Json)
        .ok_or(RequestError::NotFound)
}

pub async fn create_category(
    Extension(store): Extension<Store>,
    Json(request): Json<CreateCategoryRequest>,
) -> CreatedResult<Category> {
    if request.name.trim().is_empty() {
        return Err(RequestError::validation("name must not be empty"));
    }
    let category = store.create_category(request).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
    Json(request): Json<UpdateCategoryRequest>,
) -> JsonResult<Category> {
    store
        .update_category(&id, request)
        .await?
        .map(Json)
        .ok_or(RequestError::NotFound)
}

pub async fn delete_category(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
) -> Result<StatusCode, RequestError> {
    if store.delete_category(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(RequestError::NotFound)
    }
}

// ----------------- Article Handlers -----------------
pub async fn list_articles(
    Extension(store): Extension<Store>,
    Query(params): Query<ArticleQueryParams>,
) -> Json<Vec<Article>> {
    Json(store.list_articles(&params.into_filter()).await)
}

pub async fn preview_article(Extension(store): Extension<Store>) -> JsonResult<Article> {
    store
        .featured_or_latest()
        .await
        .map(Json)
        .ok_or(RequestError::NotFound)
}

pub async fn get_article(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
) -> JsonResult<Article> {
    store
        .get_article_by_id(&id)
        .await
        .map(Json)
        .ok_or(RequestError::NotFound)
}

pub async fn get_article_by_slug(
    Extension(store): Extension<Store>,
    Path(slug): Path<String>,
) -> JsonResult<Article> {
    store
        .get_article_by_slug(&slug)
        .await
        .map(Json)
        .ok_or(RequestError::NotFound)
}

pub async fn create_article(
    Extension(store): Extension<Store>,
    Json(request): Json<CreateArticleRequest>,
) -> CreatedResult<Article> {
    if request.title.trim().is_empty() {
        return Err(RequestError::validation("title must not be empty"));
    }
    let article = store.create_article(request).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn update_article(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
    Json(request): Json<UpdateArticleRequest>,
) -> JsonResult<Article> {
    store
        .update_article(&id, request)
        .await?
        .map(Json)
        .ok_or(RequestError::NotFound)
}

pub async fn delete_article(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
) -> Result<StatusCode, RequestError> {
    if store.delete_article(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(RequestError::NotFound)
    }
}

// ----------------- Content Section Handlers -----------------
pub async fn list_sections(
    Extension(store): Extension<Store>,
    Query(params): Query<ChildQueryParams>,
) -> JsonResult<Vec<ContentSection>> {
    let article_id = params
        .article_id
        .ok_or_else(|| RequestError::validation("articleId query parameter is required"))?;
    Ok(Json(store.list_sections(&article_id).await))
}

pub async fn create_section(
    Extension(store): Extension<Store>,
    Json(request): Json<CreateSectionRequest>,
) -> CreatedResult<ContentSection> {
    let section = store.create_section(request).await?;
    Ok((StatusCode::CREATED, Json(section)))
}

pub async fn update_section(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSectionRequest>,
) -> JsonResult<ContentSection> {
    store
        .update_section(&id, request)
        .await?
        .map(Json)
        .ok_or(RequestError::NotFound)
}

pub async fn delete_section(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
) -> Result<StatusCode, RequestError> {
    if store.delete_section(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(RequestError::NotFound)
    }
}

// ----------------- Media Handlers -----------------
pub async fn list_media(
    Extension(store): Extension<Store>,
    Query(params): Query<ChildQueryParams>,
) -> Json<Vec<MediaFile>> {
    Json(store.list_media(params.article_id.as_deref()).await)
}

pub async fn create_media(
    Extension(store): Extension<Store>,
    Json(request): Json<CreateMediaRequest>,
) -> CreatedResult<MediaFile> {
    if request.url.trim().is_empty() {
        return Err(RequestError::validation("url must not be empty"));
    }
    let media = store.create_media(request).await?;
    Ok((StatusCode::CREATED, Json(media)))
}

pub async fn delete_media(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
) -> Result<StatusCode, RequestError> {
    if store.delete_media(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(RequestError::NotFound)
    }
}

// ----------------- Resource Handlers -----------------
pub async fn list_resources(
    Extension(store): Extension<Store>,
    Query(params): Query<ChildQueryParams>,
) -> Json<Vec<Resource>> {
    Json(store.list_resources(params.article_id.as_deref()).await)
}

pub async fn create_resource(
    Extension(store): Extension<Store>,
    Json(request): Json<CreateResourceRequest>,
) -> CreatedResult<Resource> {
    if request.url.trim().is_empty() {
        return Err(RequestError::validation("url must not be empty"));
    }
    let resource = store.create_resource(request).await?;
    Ok((StatusCode::CREATED, Json(resource)))
}

pub async fn delete_resource(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
) -> Result<StatusCode, RequestError> {
    if store.delete_resource(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(RequestError::NotFound)
    }
}

// ----------------- Subscriber Handlers -----------------
pub async fn subscribe(
    Extension(store): Extension<Store>,
    Json(request): Json<SubscribeRequest>,
) -> CreatedResult<Subscriber> {
    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(RequestError::validation("a valid email is required"));
    }
    if !request.consent {
        return Err(RequestError::validation("consent is required to subscribe"));
    }
    let subscriber = store.upsert_subscriber(email, request.name).await?;
    Ok((StatusCode::CREATED, Json(subscriber)))
}

pub async fn list_subscribers(Extension(store): Extension<Store>) -> Json<Vec<Subscriber>> {
    Json(store.list_subscribers().await)
}

pub async fn update_subscriber(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSubscriberRequest>,
) -> JsonResult<Subscriber> {
    store
        .update_subscriber_status(&id, request.status)
        .await?
        .map(Json)
        .ok_or(RequestError::NotFound)
}

pub async fn delete_subscriber(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
) -> Result<StatusCode, RequestError> {
    if store.delete_subscriber(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(RequestError::NotFound)
    }
}

// ----------------- Contact Handlers -----------------
pub async fn submit_contact(
    Extension(store): Extension<Store>,
    Json(request): Json<ContactRequest>,
) -> CreatedResult<Contact> {
    if request.name.trim().is_empty() {
        return Err(RequestError::validation("name must not be empty"));
    }
    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(RequestError::validation("a valid email is required"));
    }
    if request.message.trim().is_empty() {
        return Err(RequestError::validation("message must not be empty"));
    }
    let contact = store.create_contact(request).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

pub async fn list_contacts(Extension(store): Extension<Store>) -> Json<Vec<Contact>> {
    Json(store.list_contacts().await)
}

pub async fn update_contact(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
    Json(request): Json<UpdateContactRequest>,
) -> JsonResult<Contact> {
    store
        .update_contact_status(&id, request.status)
        .await?
        .map(Json)
        .ok_or(RequestError::NotFound)
}

pub async fn delete_contact(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
) -> Result<StatusCode, RequestError> {
    if store.delete_contact(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(RequestError::NotFound)
    }
}

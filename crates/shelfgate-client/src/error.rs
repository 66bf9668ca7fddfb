use shelfgate_store::StoreError;
use snafu::Snafu;
use url::Url;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    #[snafu(display("Failed to build HTTP client"))]
    HttpClient { source: reqwest::Error },
    #[snafu(display("API url can not be a base: {url}"))]
    UrlNotABase { url: Url },
    #[snafu(display("Request to {url} failed"))]
    Transport { url: Url, source: reqwest::Error },
    #[snafu(display("Request to {url} returned {status}"))]
    Status {
        url: Url,
        status: reqwest::StatusCode,
    },
    #[snafu(display("Invalid response from {url}"))]
    Decode { url: Url, source: reqwest::Error },
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LoginError {
    #[snafu(display("Login request failed"))]
    LoginApi { source: ApiError },
    #[snafu(display("Failed to persist session"))]
    LoginStore { source: StoreError },
}

pub type LoginResult<T> = std::result::Result<T, LoginError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum InitError {
    #[snafu(transparent)]
    InitApi { source: ApiError },
}

pub type InitResult<T> = std::result::Result<T, InitError>;

use std::path::Path;

use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;

use super::object_store::ObjectStore;
use super::AdapterError;

/// Blocking view over one S3 bucket.
///
/// Calls bridge into the async SDK with `block_in_place`, so they must run
/// on a multi-thread tokio runtime.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    bucket: String,
    s3_client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(bucket: impl Into<String>, s3_client: aws_sdk_s3::Client) -> Self {
        Self {
            bucket: bucket.into(),
            s3_client,
        }
    }
}

impl ObjectStore for S3ObjectStore {
    fn put_object(&self, key: &str, body: &[u8]) -> Result<(), AdapterError> {
        let bucket = self.bucket.clone();
        let object_key = key.to_string();
        let body_bytes = body.to_vec();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_object()
                    .bucket(bucket)
                    .key(&object_key)
                    .body(ByteStream::from(body_bytes))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        AdapterError::object_store("write", &object_key, error.to_string())
                    })
            })
        })
    }

    fn get_object(&self, key: &str) -> Result<Option<Vec<u8>>, AdapterError> {
        let bucket = self.bucket.clone();
        let object_key = key.to_string();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let response = client
                    .get_object()
                    .bucket(bucket)
                    .key(&object_key)
                    .send()
                    .await;
                let output = match response {
                    Ok(output) => output,
                    Err(SdkError::ServiceError(service_error))
                        if service_error.err().is_no_such_key() =>
                    {
                        return Ok(None);
                    }
                    Err(error) => {
                        return Err(AdapterError::object_store(
                            "read",
                            &object_key,
                            error.to_string(),
                        ));
                    }
                };

                let data = output.body.collect().await.map_err(|error| {
                    AdapterError::object_store("read", &object_key, error.to_string())
                })?;
                Ok(Some(data.into_bytes().to_vec()))
            })
        })
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, AdapterError> {
        let bucket = self.bucket.clone();
        let prefix = prefix.to_string();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let mut pages = client
                    .list_objects_v2()
                    .bucket(bucket)
                    .prefix(&prefix)
                    .into_paginator()
                    .send();

                let mut keys = Vec::new();
                while let Some(page) = pages.next().await {
                    let page = page.map_err(|error| {
                        AdapterError::object_store("list", &prefix, error.to_string())
                    })?;
                    keys.extend(
                        page.contents()
                            .iter()
                            .filter_map(|object| object.key().map(str::to_string)),
                    );
                }
                Ok(keys)
            })
        })
    }

    fn put_file(&self, key: &str, path: &Path) -> Result<(), AdapterError> {
        let bucket = self.bucket.clone();
        let object_key = key.to_string();
        let file_path = path.to_path_buf();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let body = ByteStream::from_path(&file_path).await.map_err(|error| {
                    AdapterError::object_store("upload", &object_key, error.to_string())
                })?;
                client
                    .put_object()
                    .bucket(bucket)
                    .key(&object_key)
                    .body(body)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        AdapterError::object_store("upload", &object_key, error.to_string())
                    })
            })
        })
    }
}

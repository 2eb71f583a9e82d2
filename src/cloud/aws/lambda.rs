use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_lambda::client::Waiters;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{FunctionCode, Runtime};
use aws_sdk_lambda::waiters::function_active_v2::WaitUntilFunctionActiveV2Error;
use aws_sdk_lambda::waiters::function_updated_v2::WaitUntilFunctionUpdatedV2Error;
use log::debug;

use super::classify;
use crate::cloud::{ComputeApi, ComputeDescriptor, CloudError, CloudResult, CreateFunctionRequest};

/// [`ComputeApi`] over AWS Lambda
#[derive(Clone, Debug)]
pub struct LambdaCompute {
    client: aws_sdk_lambda::Client,
    max_wait: Duration,
}

impl LambdaCompute {
    pub fn new(client: aws_sdk_lambda::Client, max_wait: Duration) -> Self {
        Self { client, max_wait }
    }

    fn timeout(&self, function_name: &str, state: &'static str) -> CloudError {
        CloudError::WaitTimeout {
            resource: format!("function {}", function_name),
            state,
            waited: self.max_wait,
        }
    }
}

#[async_trait]
impl ComputeApi for LambdaCompute {
    async fn create_function(&self, request: &CreateFunctionRequest) -> CloudResult<ComputeDescriptor> {
        const OP: &str = "CreateFunction";
        let code = FunctionCode::builder()
            .zip_file(Blob::new(request.package.clone()))
            .build();

        let output = self
            .client
            .create_function()
            .function_name(&request.name)
            .runtime(Runtime::from(request.runtime.as_str()))
            .role(&request.role_arn)
            .handler(&request.handler)
            .code(code)
            .description(&request.description)
            .timeout(request.timeout_secs)
            .memory_size(request.memory_mb)
            .send()
            .await
            .map_err(|e| classify(OP, e))?;

        let arn = output
            .function_arn()
            .ok_or_else(|| CloudError::incomplete(OP, "FunctionArn"))?;
        Ok(ComputeDescriptor {
            name: output.function_name().unwrap_or(&request.name).to_string(),
            arn: arn.to_string(),
        })
    }

    async fn update_function_code(&self, function_name: &str, package: &[u8]) -> CloudResult<()> {
        self.client
            .update_function_code()
            .function_name(function_name)
            .zip_file(Blob::new(package.to_vec()))
            .send()
            .await
            .map_err(|e| classify("UpdateFunctionCode", e))?;
        Ok(())
    }

    async fn get_function(&self, function_name: &str) -> CloudResult<ComputeDescriptor> {
        const OP: &str = "GetFunction";
        let output = self
            .client
            .get_function()
            .function_name(function_name)
            .send()
            .await
            .map_err(|e| classify(OP, e))?;

        let configuration = output
            .configuration()
            .ok_or_else(|| CloudError::incomplete(OP, "Configuration"))?;
        let arn = configuration
            .function_arn()
            .ok_or_else(|| CloudError::incomplete(OP, "FunctionArn"))?;
        Ok(ComputeDescriptor {
            name: configuration
                .function_name()
                .unwrap_or(function_name)
                .to_string(),
            arn: arn.to_string(),
        })
    }

    async fn wait_for_function_active(&self, function_name: &str) -> CloudResult<()> {
        debug!("Waiting for {} to become Active", function_name);
        self.client
            .wait_until_function_active_v2()
            .function_name(function_name)
            .wait(self.max_wait)
            .await
            .map_err(|e| match e {
                WaitUntilFunctionActiveV2Error::ExceededMaxWait(_) => {
                    self.timeout(function_name, "Active")
                }
                other => classify("WaitFunctionActive", other),
            })?;
        Ok(())
    }

    async fn wait_for_function_updated(&self, function_name: &str) -> CloudResult<()> {
        debug!("Waiting for {} update to finish", function_name);
        self.client
            .wait_until_function_updated_v2()
            .function_name(function_name)
            .wait(self.max_wait)
            .await
            .map_err(|e| match e {
                WaitUntilFunctionUpdatedV2Error::ExceededMaxWait(_) => {
                    self.timeout(function_name, "Successful")
                }
                other => classify("WaitFunctionUpdated", other),
            })?;
        Ok(())
    }
}

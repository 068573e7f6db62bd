//! 流式适配器
//!
//! 各后端的增量响应被包装成 FragmentSource（单一 receive 操作），
//! 由一个后台桥接任务读出并写入容量为 STREAM_BUFFER 的有界通道，调用方按需拉取。
//! 桥接任务无论正常结束还是出错，都在同一出口释放发送端，消费者因此总能看到
//! 流结束或最后一个 Err 元素。

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;

use crate::llm::traits::{process_text, LlmError};
use crate::memory::{Message, Role};

/// 桥接通道容量：满时阻塞生产方
pub const STREAM_BUFFER: usize = 5;

/// 后端增量响应的统一读取接口
///
/// 返回 `None` 表示正常结束；`Some(Err(_))` 表示出错，之后不应再调用。
#[async_trait]
pub trait FragmentSource: Send {
    async fn receive(&mut self) -> Option<Result<String, LlmError>>;
}

/// 把任意 `Stream<Item = Result<String, LlmError>>` 适配为 FragmentSource
pub struct StreamSource<S> {
    inner: S,
}

impl<S> StreamSource<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S> FragmentSource for StreamSource<S>
where
    S: Stream<Item = Result<String, LlmError>> + Send + Unpin,
{
    async fn receive(&mut self) -> Option<Result<String, LlmError>> {
        self.inner.next().await
    }
}

/// 调用方拿到的惰性消息片段流；不可重放
pub struct MessageStream {
    rx: mpsc::Receiver<Result<Message, LlmError>>,
}

impl MessageStream {
    /// 启动桥接任务，把 source 的片段转发到有界通道
    pub fn bridge(mut source: Box<dyn FragmentSource>) -> Self {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(async move {
            let mut fragments = 0usize;
            while let Some(item) = source.receive().await {
                match item {
                    Ok(text) => {
                        let text = process_text(&text);
                        if text.is_empty() {
                            continue;
                        }
                        fragments += 1;
                        if tx.send(Ok(Message::assistant(text))).await.is_err() {
                            tracing::debug!(fragments, "stream consumer dropped");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(fragments, error = %e, "stream terminated with error");
                        let _ = tx.send(Err(e)).await;
                        break;
                    }
                }
            }
            drop(tx);
        });
        Self { rx }
    }

    /// 只含一个错误元素的流
    pub fn failed(error: LlmError) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.try_send(Err(error));
        Self { rx }
    }

    /// 拉取下一个片段；None 表示流已结束
    pub async fn recv(&mut self) -> Option<Result<Message, LlmError>> {
        self.rx.recv().await
    }
}

impl Stream for MessageStream {
    type Item = Result<Message, LlmError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// 把整个流拼接成一条助手消息；遇到错误即返回该错误
pub async fn collect(mut stream: MessageStream) -> Result<Message, LlmError> {
    let mut content = String::new();
    while let Some(item) = stream.recv().await {
        content.push_str(&item?.content);
    }
    Ok(Message::new(Role::Assistant, content))
}
